//! Kalshi integration for the Paper hedging backend
//!
//! Unauthenticated client for the Kalshi trade API public endpoints,
//! adapting exchange markets into the common contract shape.

pub mod client;
pub mod types;

pub use client::KalshiClient;
pub use types::{KalshiMarket, MarketsResponse};
