//! Polymarket Gamma API response types
//!
//! Gamma serializes numbers inconsistently (strings, numbers, or stringified
//! arrays depending on the endpoint), so parsing happens through fallbacks.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use paper_core::{format_price, format_volume, MarketContract, Provider};

/// A Polymarket market from the Gamma API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolymarketMarket {
    /// Market ID
    pub id: String,

    /// The market question
    pub question: String,

    /// URL slug
    #[serde(default)]
    pub slug: Option<String>,

    /// When the market resolves
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,

    /// Total volume as a string
    #[serde(default)]
    pub volume: Option<String>,

    /// Total volume as a number (some responses use this instead)
    #[serde(default)]
    pub volume_num: Option<f64>,

    /// Outcome prices, a stringified two-element array [yes, no]
    #[serde(default)]
    pub outcome_prices: Option<String>,

    /// Whether the market is active
    #[serde(default)]
    pub active: Option<bool>,

    /// Whether the market is closed
    #[serde(default)]
    pub closed: Option<bool>,
}

impl PolymarketMarket {
    /// Parse outcome prices into (yes, no)
    pub fn parse_outcome_prices(&self) -> Option<(Decimal, Decimal)> {
        let prices_str = self.outcome_prices.as_ref()?;

        // Try to parse as JSON array of strings first (most common format)
        if let Ok(prices) = serde_json::from_str::<Vec<String>>(prices_str) {
            if prices.len() >= 2 {
                let yes = Decimal::from_str(&prices[0]).unwrap_or(Decimal::ZERO);
                let no = Decimal::from_str(&prices[1]).unwrap_or(Decimal::ZERO);
                return Some((yes, no));
            }
        }

        // Try to parse as JSON array of numbers
        if let Ok(prices) = serde_json::from_str::<Vec<f64>>(prices_str) {
            if prices.len() >= 2 {
                let yes = Decimal::from_str(&prices[0].to_string()).unwrap_or(Decimal::ZERO);
                let no = Decimal::from_str(&prices[1].to_string()).unwrap_or(Decimal::ZERO);
                return Some((yes, no));
            }
        }

        // Comma-separated fallback
        let parts: Vec<&str> = prices_str
            .trim_matches(|c| c == '[' || c == ']')
            .split(',')
            .collect();
        if parts.len() >= 2 {
            let yes = Decimal::from_str(parts[0].trim().trim_matches('"')).unwrap_or(Decimal::ZERO);
            let no = Decimal::from_str(parts[1].trim().trim_matches('"')).unwrap_or(Decimal::ZERO);
            return Some((yes, no));
        }

        None
    }

    /// Parse volume from whichever field the response populated
    pub fn parse_volume(&self) -> Decimal {
        if let Some(v) = self.volume_num {
            return Decimal::from_str(&v.to_string()).unwrap_or(Decimal::ZERO);
        }

        self.volume
            .as_ref()
            .and_then(|v| Decimal::from_str(v).ok())
            .unwrap_or(Decimal::ZERO)
    }

    /// Convert to the normalized contract shape
    pub fn to_contract(&self) -> MarketContract {
        let (yes_price, no_price) = self
            .parse_outcome_prices()
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));

        let expiry = self
            .end_date
            .map(|t| t.format("%b %d, %Y").to_string())
            .unwrap_or_else(|| "TBD".to_string());

        MarketContract {
            id: MarketContract::namespaced_id(Provider::Polymarket, &self.id),
            provider: Provider::Polymarket,
            title: self.question.clone(),
            volume: format_volume(self.parse_volume()),
            yes_price: format_price(yes_price),
            no_price: format_price(no_price),
            expiry,
        }
    }
}
