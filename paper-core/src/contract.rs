//! Normalized market contract schema

use serde::{Deserialize, Serialize};

use crate::provider::Provider;

/// A single binary-outcome market, normalized across providers
///
/// Prices and volume are display strings because every provider quotes them
/// differently; `crate::money` parses volume back into a magnitude when a
/// numeric ordering is needed. The YES and NO sides are quoted independently
/// by each provider and do not necessarily sum to one dollar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContract {
    /// Provider-namespaced unique id, e.g. "kalshi:KXCPI-26JAN"
    pub id: String,
    /// Source provider
    pub provider: Provider,
    /// Market question or title
    pub title: String,
    /// Formatted traded volume, e.g. "$1.5M"
    pub volume: String,
    /// Price of the YES side, e.g. "$0.42"
    pub yes_price: String,
    /// Price of the NO side, e.g. "$0.60"
    pub no_price: String,
    /// Human-readable expiry date, "TBD" when the provider reports none
    pub expiry: String,
}

impl MarketContract {
    /// Namespace a provider-local id so ids never collide across providers
    pub fn namespaced_id(provider: Provider, raw: &str) -> String {
        format!("{}:{}", provider, raw)
    }
}
