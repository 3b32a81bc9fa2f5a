//! Core types for the Paper hedging backend
//!
//! This crate defines the shared vocabulary used across the workspace:
//! the provider enum and selector, the normalized market contract schema,
//! conversation messages, search intents, and the provider adapter seam.

pub mod adapter;
pub mod contract;
pub mod error;
pub mod intent;
pub mod message;
pub mod money;
pub mod provider;

pub use adapter::MarketAdapter;
pub use contract::MarketContract;
pub use error::{PaperError, PaperResult};
pub use intent::{DispatchOutcome, SearchFilters, SearchIntent};
pub use message::{Message, SearchArgs, ToolCallRecord, SEARCH_MARKETS_TOOL};
pub use money::{format_price, format_volume, parse_volume};
pub use provider::{Provider, ProviderSelector};
