//! Business logic services for the Paper hedging backend
//!
//! This crate wires provider adapters, the advisor and per-session state
//! into conversation turns and one-shot market searches.

pub mod aggregator;
pub mod conversation;
pub mod dispatcher;
pub mod session;

pub use aggregator::{MarketAggregator, ProviderResult, DEFAULT_MAX_RESULTS};
pub use conversation::{ConversationService, TurnOutcome};
pub use dispatcher::{DispatchConfig, ToolDispatcher};
pub use session::{Session, SessionSlot, SessionStore, DEFAULT_SESSION_TTL_SECS};
