//! Merges per-provider search results into one ranked market list

use std::cmp::Reverse;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use paper_core::{parse_volume, MarketContract, PaperError, PaperResult, Provider};

/// Default cap on markets returned from one aggregation
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// What one provider's search came back with
#[derive(Debug)]
pub struct ProviderResult {
    pub provider: Provider,
    pub outcome: PaperResult<Vec<MarketContract>>,
}

impl ProviderResult {
    pub fn ok(provider: Provider, contracts: Vec<MarketContract>) -> Self {
        ProviderResult {
            provider,
            outcome: Ok(contracts),
        }
    }

    pub fn failed(provider: Provider, error: PaperError) -> Self {
        ProviderResult {
            provider,
            outcome: Err(error),
        }
    }
}

/// Combines provider results: dedup, filter, rank, cap
#[derive(Debug, Clone)]
pub struct MarketAggregator {
    max_results: usize,
}

impl Default for MarketAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketAggregator {
    pub fn new() -> Self {
        MarketAggregator {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(max_results: usize) -> Self {
        MarketAggregator { max_results }
    }

    /// Merge provider results into the list a user sees
    ///
    /// Successful providers are concatenated with duplicates collapsed by
    /// contract id, later entries winning. A non-empty query keeps only
    /// titles containing at least one query term, case-insensitive. The
    /// survivors are ranked by traded volume and capped.
    ///
    /// Failures are tolerated as long as one provider succeeded; when every
    /// provider failed the whole merge fails with the collected reasons.
    #[instrument(skip(self, results))]
    pub fn merge(
        &self,
        results: Vec<ProviderResult>,
        query: &str,
    ) -> PaperResult<Vec<MarketContract>> {
        let total = results.len();
        let mut failures = Vec::new();
        let mut merged: IndexMap<String, MarketContract> = IndexMap::new();

        for result in results {
            match result.outcome {
                Ok(contracts) => {
                    debug!("Got {} markets from {}", contracts.len(), result.provider);
                    for contract in contracts {
                        merged.insert(contract.id.clone(), contract);
                    }
                }
                Err(e) => {
                    warn!("Provider {} failed: {}", result.provider, e);
                    failures.push(format!("{}: {}", result.provider, e));
                }
            }
        }

        if total > 0 && failures.len() == total {
            return Err(PaperError::aggregate(failures.join("; ")));
        }

        let mut markets: Vec<MarketContract> = merged.into_values().collect();

        let needle = query.trim().to_lowercase();
        if !needle.is_empty() {
            let terms: Vec<&str> = needle.split_whitespace().collect();
            markets.retain(|m| title_matches(&m.title, &terms));
        }

        let markets = self.rank(markets);
        debug!("Aggregated {} markets for query '{}'", markets.len(), query);
        Ok(markets)
    }

    /// Dedup by id, rank by volume, cap
    ///
    /// Used on already-merged lists too, like the union of all dispatches in
    /// one conversation turn.
    pub fn rank(&self, markets: Vec<MarketContract>) -> Vec<MarketContract> {
        let mut merged: IndexMap<String, MarketContract> = IndexMap::new();
        for market in markets {
            merged.insert(market.id.clone(), market);
        }

        let mut markets: Vec<MarketContract> = merged.into_values().collect();
        rank_by_volume(&mut markets);
        markets.truncate(self.max_results);
        markets
    }
}

/// True when any query term appears in the title
fn title_matches(title: &str, terms: &[&str]) -> bool {
    let title = title.to_lowercase();
    terms.iter().any(|term| title.contains(term))
}

/// Highest traded volume first; unparseable volumes sink to the end
///
/// Stable sort, so ties keep their merge order.
fn rank_by_volume(markets: &mut [MarketContract]) {
    markets.sort_by_key(|m| Reverse(parse_volume(&m.volume).unwrap_or(Decimal::MIN)));
}
