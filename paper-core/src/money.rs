//! Volume and price formatting helpers

use std::str::FromStr;

use rust_decimal::Decimal;

/// Format a traded-volume magnitude as a compact dollar string
pub fn format_volume(volume: Decimal) -> String {
    let million = Decimal::from(1_000_000);
    let thousand = Decimal::from(1_000);

    if volume >= million {
        format!("${:.1}M", volume / million)
    } else if volume >= thousand {
        format!("${:.1}K", volume / thousand)
    } else {
        format!("${:.0}", volume)
    }
}

/// Parse a formatted volume string back into a numeric magnitude
///
/// Handles currency symbols, thousands separators, and K/M/B suffixes.
/// Returns `None` for strings with no parseable number.
pub fn parse_volume(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    if cleaned.is_empty() {
        return None;
    }

    let (digits, multiplier) = match cleaned.as_bytes()[cleaned.len() - 1].to_ascii_uppercase() {
        b'K' => (&cleaned[..cleaned.len() - 1], Decimal::from(1_000)),
        b'M' => (&cleaned[..cleaned.len() - 1], Decimal::from(1_000_000)),
        b'B' => (&cleaned[..cleaned.len() - 1], Decimal::from(1_000_000_000)),
        _ => (cleaned.as_str(), Decimal::ONE),
    };

    Decimal::from_str(digits.trim()).ok().map(|n| n * multiplier)
}

/// Format a 0..1 contract price as dollars, e.g. "$0.42"
pub fn format_price(price: Decimal) -> String {
    format!("${:.2}", price)
}
