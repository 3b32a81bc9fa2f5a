//! Provider definitions for prediction markets

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PaperError;

/// Supported prediction market providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Kalshi - US regulated binary-outcome exchange
    Kalshi,
    /// Polymarket - peer-to-peer prediction market protocol
    Polymarket,
}

impl Provider {
    /// Every configured provider, in fan-out order
    pub const ALL: [Provider; 2] = [Provider::Kalshi, Provider::Polymarket];

    /// Lowercase identifier used on the wire and in namespaced contract ids
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Kalshi => "kalshi",
            Provider::Polymarket => "polymarket",
        }
    }

    /// Full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Kalshi => "Kalshi",
            Provider::Polymarket => "Polymarket",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kalshi" | "k" => Ok(Provider::Kalshi),
            "polymarket" | "poly" | "p" => Ok(Provider::Polymarket),
            other => Err(PaperError::client(format!("Unknown provider: {}", other))),
        }
    }
}

/// Which providers a search targets
///
/// Serializes as the plain strings `"all"`, `"kalshi"`, `"polymarket"` so
/// tool-call args and query parameters stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderSelector {
    /// Fan out to every configured provider
    #[default]
    All,
    /// A single provider
    Only(Provider),
}

impl ProviderSelector {
    /// Providers this selector resolves to
    pub fn providers(&self) -> Vec<Provider> {
        match self {
            ProviderSelector::All => Provider::ALL.to_vec(),
            ProviderSelector::Only(provider) => vec![*provider],
        }
    }
}

impl fmt::Display for ProviderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSelector::All => write!(f, "all"),
            ProviderSelector::Only(provider) => write!(f, "{}", provider),
        }
    }
}

impl FromStr for ProviderSelector {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() || normalized == "all" {
            return Ok(ProviderSelector::All);
        }
        normalized.parse::<Provider>().map(ProviderSelector::Only)
    }
}

impl Serialize for ProviderSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProviderSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_known_names() {
        assert_eq!("kalshi".parse::<Provider>().unwrap(), Provider::Kalshi);
        assert_eq!("Polymarket".parse::<Provider>().unwrap(), Provider::Polymarket);
        assert_eq!("poly".parse::<Provider>().unwrap(), Provider::Polymarket);
        assert!("predictit".parse::<Provider>().is_err());
    }

    #[test]
    fn selector_parses_all_and_specific() {
        assert_eq!("all".parse::<ProviderSelector>().unwrap(), ProviderSelector::All);
        assert_eq!("".parse::<ProviderSelector>().unwrap(), ProviderSelector::All);
        assert_eq!(
            "kalshi".parse::<ProviderSelector>().unwrap(),
            ProviderSelector::Only(Provider::Kalshi)
        );
    }

    #[test]
    fn selector_rejects_unknown_as_client_error() {
        let err = "betfair".parse::<ProviderSelector>().unwrap_err();
        assert!(err.is_client(), "expected client error, got {:?}", err);
    }

    #[test]
    fn selector_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&ProviderSelector::All).unwrap(), "\"all\"");
        assert_eq!(
            serde_json::to_string(&ProviderSelector::Only(Provider::Polymarket)).unwrap(),
            "\"polymarket\""
        );
        let parsed: ProviderSelector = serde_json::from_str("\"kalshi\"").unwrap();
        assert_eq!(parsed, ProviderSelector::Only(Provider::Kalshi));
    }
}
