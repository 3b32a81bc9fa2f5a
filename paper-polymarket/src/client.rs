//! Polymarket API client
//!
//! Fetches open markets from the Polymarket Gamma API and adapts them into
//! the common contract shape.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use paper_core::{
    MarketAdapter, MarketContract, PaperError, PaperResult, Provider, SearchFilters,
};

use crate::types::PolymarketMarket;

/// Base URL for the Polymarket Gamma API
const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

/// Markets fetched per page
const PAGE_LIMIT: u32 = 100;

/// Default size of the open-market pool fetched per search
const DEFAULT_POOL_SIZE: usize = 500;

/// Polymarket Gamma API client
#[derive(Debug, Clone)]
pub struct PolymarketClient {
    client: Client,
    base_url: String,
}

impl PolymarketClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: GAMMA_API_BASE.to_string(),
        }
    }

    /// Point the client at a different base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut client = Self::new();
        client.base_url = base_url.into();
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of active markets, volume ordered server-side
    async fn markets_page(&self, offset: u32) -> PaperResult<Vec<PolymarketMarket>> {
        let mut url = format!("{}/markets", self.base_url);

        let params = vec![
            format!("limit={}", PAGE_LIMIT),
            format!("offset={}", offset),
            "active=true".to_string(),
            "closed=false".to_string(),
            "order=volume".to_string(),
            "ascending=false".to_string(),
        ];

        url.push('?');
        url.push_str(&params.join("&"));

        debug!("Fetching Polymarket markets from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PaperError::network(format!("Failed to fetch Polymarket markets: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaperError::api(format!(
                "Polymarket API error ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PaperError::parse(format!("Failed to parse Polymarket markets: {}", e)))
    }

    /// Fetch the open-market pool
    ///
    /// Gamma orders by volume server-side, so pages arrive ranked already.
    #[instrument(skip(self))]
    pub async fn open_markets(&self, max_markets: usize) -> PaperResult<Vec<MarketContract>> {
        let mut all_markets: Vec<PolymarketMarket> = Vec::new();
        let mut offset = 0u32;

        loop {
            let page = self.markets_page(offset).await?;
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            all_markets.extend(page);

            if all_markets.len() >= max_markets || page_len < PAGE_LIMIT as usize {
                break;
            }

            offset += PAGE_LIMIT;
        }

        debug!("Fetched {} Polymarket markets", all_markets.len());

        all_markets.truncate(max_markets);

        Ok(all_markets.iter().map(|m| m.to_contract()).collect())
    }
}

impl Default for PolymarketClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketAdapter for PolymarketClient {
    fn provider(&self) -> Provider {
        Provider::Polymarket
    }

    async fn search(
        &self,
        _query: &str,
        filters: &SearchFilters,
    ) -> PaperResult<Vec<MarketContract>> {
        // No upstream text search; the aggregation step filters by query.
        self.open_markets(filters.limit.unwrap_or(DEFAULT_POOL_SIZE))
            .await
    }
}
