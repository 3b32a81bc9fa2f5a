//! Search intents and dispatch results

use serde::{Deserialize, Serialize};

use crate::contract::MarketContract;
use crate::message::ToolCallRecord;
use crate::provider::ProviderSelector;

/// Optional constraints attached to a search intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Upper bound on how many markets each provider fetches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// A structured request to search one or more providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIntent {
    #[serde(default)]
    pub provider: ProviderSelector,
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
}

impl SearchIntent {
    pub fn new(provider: ProviderSelector, query: impl Into<String>) -> Self {
        SearchIntent {
            provider,
            query: query.into(),
            filters: SearchFilters::default(),
        }
    }
}

/// Result of dispatching one search intent
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Aggregated, ranked contracts for this dispatch
    pub markets: Vec<MarketContract>,
    /// Summary attached to the turn's tool message
    pub record: ToolCallRecord,
    /// Set when every provider failed for this dispatch
    pub failure: Option<String>,
}
