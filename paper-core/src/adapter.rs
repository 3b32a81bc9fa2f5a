//! Provider adapter seam

use async_trait::async_trait;

use crate::contract::MarketContract;
use crate::error::PaperResult;
use crate::intent::SearchFilters;
use crate::provider::Provider;

/// Normalizes one provider's search capability into the common contract shape
///
/// Implementations keep failures inside the returned error: a timeout or an
/// unparseable upstream payload is a `PaperError`, never a panic, so a
/// fan-out can degrade the failed provider to zero results and keep going.
#[async_trait]
pub trait MarketAdapter: Send + Sync {
    /// Which provider this adapter fronts
    fn provider(&self) -> Provider;

    /// Fetch contracts relevant to `query`
    ///
    /// Upstreams without text search return their open, volume-ranked pool
    /// and leave query filtering to the aggregation step.
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> PaperResult<Vec<MarketContract>>;
}
