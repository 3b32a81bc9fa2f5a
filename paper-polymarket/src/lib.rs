//! Polymarket integration for the Paper hedging backend
//!
//! Client for the Polymarket Gamma API, adapting peer-to-peer markets into
//! the common contract shape.

pub mod client;
pub mod types;

pub use client::PolymarketClient;
pub use types::PolymarketMarket;
