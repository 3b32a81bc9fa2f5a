//! Kalshi API client
//!
//! Fetches open markets from the Kalshi REST API and adapts them into the
//! common contract shape.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use paper_core::{
    MarketAdapter, MarketContract, PaperError, PaperResult, Provider, SearchFilters,
};

use crate::types::{KalshiMarket, MarketsResponse};

/// Base URL for the Kalshi trade API
const KALSHI_API_BASE: &str = "https://api.elections.kalshi.com/trade-api/v2";

/// Markets fetched per page
const PAGE_LIMIT: u32 = 100;

/// Default size of the open-market pool fetched per search
const DEFAULT_POOL_SIZE: usize = 500;

/// Kalshi API client (public endpoints only)
#[derive(Debug, Clone)]
pub struct KalshiClient {
    client: Client,
    base_url: String,
}

impl KalshiClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: KALSHI_API_BASE.to_string(),
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

    /// Fetch one page of open markets
    async fn markets_page(&self, cursor: Option<&str>) -> PaperResult<MarketsResponse> {
        let mut url = format!("{}/markets?limit={}&status=open", self.base_url, PAGE_LIMIT);
        if let Some(c) = cursor {
            url.push_str(&format!("&cursor={}", c));
        }

        debug!("Fetching Kalshi markets page, cursor: {:?}", cursor);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PaperError::network(format!("Failed to fetch Kalshi markets: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaperError::api(format!(
                "Kalshi API error ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PaperError::parse(format!("Failed to parse Kalshi markets: {}", e)))
    }

    /// Fetch the open-market pool, sorted by volume descending
    ///
    /// The API has no server-side volume ordering or text search, so pages
    /// are collected up to `max_markets` and sorted client-side.
    #[instrument(skip(self))]
    pub async fn open_markets(&self, max_markets: usize) -> PaperResult<Vec<MarketContract>> {
        let mut all_markets: Vec<KalshiMarket> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.markets_page(cursor.as_deref()).await?;
            all_markets.extend(page.markets);

            if all_markets.len() >= max_markets {
                break;
            }

            // Check for more pages
            match page.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }

        debug!("Fetched {} Kalshi markets, sorting by volume", all_markets.len());

        all_markets.sort_by(|a, b| b.volume.unwrap_or(0).cmp(&a.volume.unwrap_or(0)));
        all_markets.truncate(max_markets);

        Ok(all_markets.iter().map(|m| m.to_contract()).collect())
    }
}

impl Default for KalshiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketAdapter for KalshiClient {
    fn provider(&self) -> Provider {
        Provider::Kalshi
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
