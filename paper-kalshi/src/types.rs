//! Kalshi API response types
//!
//! These types mirror the Kalshi API responses and are converted to the
//! common contract shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use paper_core::{format_price, format_volume, MarketContract, Provider};

/// Response from GET /markets
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsResponse {
    #[serde(default)]
    pub markets: Vec<KalshiMarket>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// A Kalshi market from the API
#[derive(Debug, Clone, Deserialize)]
pub struct KalshiMarket {
    /// Market ticker (unique identifier)
    pub ticker: String,

    /// Market title
    pub title: String,

    /// Short description
    #[serde(default)]
    pub subtitle: Option<String>,

    /// Current YES bid in cents (1-99)
    #[serde(default)]
    pub yes_bid: Option<i64>,

    /// Current YES ask in cents
    #[serde(default)]
    pub yes_ask: Option<i64>,

    /// Current NO bid in cents
    #[serde(default)]
    pub no_bid: Option<i64>,

    /// Current NO ask in cents
    #[serde(default)]
    pub no_ask: Option<i64>,

    /// Last traded YES price in cents
    #[serde(default)]
    pub last_price: Option<i64>,

    /// Total traded volume in contracts
    #[serde(default)]
    pub volume: Option<i64>,

    /// Market status
    #[serde(default)]
    pub status: Option<String>,

    /// When the market closes
    #[serde(default)]
    pub close_time: Option<DateTime<Utc>>,

    /// When the market expires
    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,
}

impl KalshiMarket {
    /// Convert cents to a decimal price (0.00 - 1.00)
    pub fn cents_to_decimal(cents: Option<i64>) -> Decimal {
        match cents {
            Some(c) => Decimal::from(c) / Decimal::from(100),
            None => Decimal::ZERO,
        }
    }

    /// YES price: last trade, then bid/ask midpoint, then whichever side exists
    pub fn yes_price(&self) -> Decimal {
        if let Some(price) = self.last_price {
            return Self::cents_to_decimal(Some(price));
        }
        if let (Some(bid), Some(ask)) = (self.yes_bid, self.yes_ask) {
            return Self::cents_to_decimal(Some((bid + ask) / 2));
        }
        Self::cents_to_decimal(self.yes_bid.or(self.yes_ask))
    }

    /// NO price from the no side's own quotes, falling back to 1 - YES
    ///
    /// The exchange quotes both sides independently, so the two prices are
    /// not guaranteed to sum to one dollar.
    pub fn no_price(&self) -> Decimal {
        if let (Some(bid), Some(ask)) = (self.no_bid, self.no_ask) {
            return Self::cents_to_decimal(Some((bid + ask) / 2));
        }
        if self.no_bid.is_some() || self.no_ask.is_some() {
            return Self::cents_to_decimal(self.no_bid.or(self.no_ask));
        }
        Decimal::ONE - self.yes_price()
    }

    /// Convert to the normalized contract shape
    pub fn to_contract(&self) -> MarketContract {
        let expiry = self
            .close_time
            .or(self.expiration_time)
            .map(|t| t.format("%b %d, %Y").to_string())
            .unwrap_or_else(|| "TBD".to_string());

        MarketContract {
            id: MarketContract::namespaced_id(Provider::Kalshi, &self.ticker),
            provider: Provider::Kalshi,
            title: self.title.clone(),
            volume: format_volume(Decimal::from(self.volume.unwrap_or(0))),
            yes_price: format_price(self.yes_price()),
            no_price: format_price(self.no_price()),
            expiry,
        }
    }
}
