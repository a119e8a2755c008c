//! Money parsing and monthly normalization
//!
//! Turns loosely formatted user amounts ("1.2k", "$1,200", "100-150")
//! into floats, then scales them to a monthly figure by pay frequency.
//! Nothing in here returns an error: unparseable input is `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Average month length in days (365.25 / 12)
pub const AVG_DAYS_PER_MONTH: f64 = 30.4375;

/// Characters dropped before parsing: thousands separators and currency symbols
const STRIPPED_CHARS: &[char] = &[',', '$', '€', '£', '¥'];

//
// ================= Raw Amount =================
//

/// An amount as the user (or the LLM) handed it to us
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    /// Parse this value into a float, `None` when it cannot be read as money
    pub fn parse(&self) -> Option<f64> {
        match self {
            RawAmount::Number(value) => Some(*value),
            RawAmount::Text(text) => parse_money_text(text),
        }
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Number(value as f64)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(value: String) -> Self {
        RawAmount::Text(value)
    }
}

/// Parse an optional raw amount. Absent input stays absent.
pub fn parse_money(raw: Option<&RawAmount>) -> Option<f64> {
    raw.and_then(RawAmount::parse)
}

/// Parse a free-form money string.
///
/// Rules, in order:
/// 1. lowercase, drop separators and currency symbols, trim
/// 2. trailing `k` multiplies the rest by 1000
/// 3. a hyphenated range yields the mean of its parts
/// 4. otherwise a plain float
///
/// A range with any unreadable part falls through to rule 4, which is what
/// lets negative amounts like `"-50"` through.
pub fn parse_money_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect();
    let cleaned = cleaned.trim();

    if let Some(thousands) = cleaned.strip_suffix('k') {
        return parse_float(thousands).map(|value| value * 1000.0);
    }

    if cleaned.contains('-') {
        if let Some(midpoint) = parse_range(cleaned) {
            return Some(midpoint);
        }
    }

    parse_float(cleaned)
}

fn parse_range(text: &str) -> Option<f64> {
    let parts = text
        .split('-')
        .map(parse_float)
        .collect::<Option<Vec<f64>>>()?;

    Some(parts.iter().sum::<f64>() / parts.len() as f64)
}

fn parse_float(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

//
// ================= Frequency =================
//

/// How often an amount recurs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Frequency {
    #[default]
    Unset,
    Monthly,
    Yearly,
    Weekly,
    Biweekly,
    Daily,
    /// Unrecognized tag, kept verbatim and treated as monthly
    Other(String),
}

impl Frequency {
    /// Map a tag to a frequency. Matching is exact, anything unknown is `Other`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            None => Frequency::Unset,
            Some("monthly") => Frequency::Monthly,
            Some("yearly") | Some("annual") => Frequency::Yearly,
            Some("weekly") => Frequency::Weekly,
            Some("biweekly") | Some("bi-weekly") => Frequency::Biweekly,
            Some("daily") => Frequency::Daily,
            Some(other) => Frequency::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> Option<&str> {
        match self {
            Frequency::Unset => None,
            Frequency::Monthly => Some("monthly"),
            Frequency::Yearly => Some("yearly"),
            Frequency::Weekly => Some("weekly"),
            Frequency::Biweekly => Some("biweekly"),
            Frequency::Daily => Some("daily"),
            Frequency::Other(tag) => Some(tag.as_str()),
        }
    }

    /// Scale an amount at this frequency to its monthly equivalent
    pub fn to_monthly(&self, amount: f64) -> f64 {
        match self {
            Frequency::Unset | Frequency::Monthly | Frequency::Other(_) => amount,
            Frequency::Yearly => amount / 12.0,
            Frequency::Weekly => amount * 52.0 / 12.0,
            Frequency::Biweekly => amount * 26.0 / 12.0,
            Frequency::Daily => amount * AVG_DAYS_PER_MONTH,
        }
    }
}

impl From<Option<String>> for Frequency {
    fn from(tag: Option<String>) -> Self {
        Frequency::from_tag(tag.as_deref())
    }
}

impl From<Frequency> for Option<String> {
    fn from(frequency: Frequency) -> Self {
        frequency.as_tag().map(str::to_string)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag().unwrap_or("unset"))
    }
}

/// Convert an optional amount to monthly. Absent stays absent, no rounding.
pub fn normalize_to_monthly(amount: Option<f64>, frequency: &Frequency) -> Option<f64> {
    amount.map(|value| frequency.to_monthly(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("expected a parsed amount");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn text(s: &str) -> Option<f64> {
        parse_money(Some(&RawAmount::from(s)))
    }

    #[test]
    fn test_numbers_pass_through() {
        for value in [0.0, 42.0, -3.5, 1e9, 0.01] {
            assert_eq!(parse_money(Some(&RawAmount::Number(value))), Some(value));
        }
        assert_eq!(parse_money(Some(&RawAmount::from(7_i64))), Some(7.0));
    }

    #[test]
    fn test_absent_input() {
        assert_eq!(parse_money(None), None);
    }

    #[test]
    fn test_thousands_suffix() {
        assert_eq!(text("1.2k"), Some(1200.0));
        assert_eq!(text("3K"), Some(3000.0));
        assert_close(text("$1.5 k"), 1500.0);
        assert_eq!(text("k"), None);
        assert_eq!(text("abck"), None);
    }

    #[test]
    fn test_currency_and_separators() {
        assert_eq!(text("$1,200"), Some(1200.0));
        assert_eq!(text("  250 "), Some(250.0));
        assert_eq!(text("£2,500.50"), Some(2500.5));
    }

    #[test]
    fn test_ranges_take_the_mean() {
        assert_eq!(text("100-150"), Some(125.0));
        assert_eq!(text("$100 - $150"), Some(125.0));
        assert_eq!(text("10-20-30"), Some(20.0));
    }

    #[test]
    fn test_mixed_range_falls_through_to_absent() {
        assert_eq!(text("100-abc"), None);
    }

    #[test]
    fn test_negative_amount_survives_range_fallthrough() {
        assert_eq!(text("-50"), Some(-50.0));
    }

    #[test]
    fn test_garbage_is_absent() {
        assert_eq!(text("abc"), None);
        assert_eq!(text(""), None);
        assert_eq!(text("nan"), None);
        assert_eq!(text("inf"), None);
    }

    #[test]
    fn test_raw_amount_deserializes_untagged() {
        let number: RawAmount = serde_json::from_str("1200").unwrap();
        assert_eq!(number, RawAmount::Number(1200.0));

        let text: RawAmount = serde_json::from_str("\"1.2k\"").unwrap();
        assert_eq!(text.parse(), Some(1200.0));
    }

    #[test]
    fn test_frequency_table() {
        assert_eq!(normalize_to_monthly(Some(1200.0), &Frequency::from_tag(Some("yearly"))), Some(100.0));
        assert_eq!(normalize_to_monthly(Some(1200.0), &Frequency::from_tag(Some("annual"))), Some(100.0));
        assert_close(normalize_to_monthly(Some(100.0), &Frequency::from_tag(Some("weekly"))), 433.333_333_333_333_3);
        assert_close(normalize_to_monthly(Some(100.0), &Frequency::from_tag(Some("biweekly"))), 216.666_666_666_666_66);
        assert_close(normalize_to_monthly(Some(100.0), &Frequency::from_tag(Some("bi-weekly"))), 216.666_666_666_666_66);
        assert_eq!(normalize_to_monthly(Some(10.0), &Frequency::from_tag(Some("daily"))), Some(304.375));
        assert_eq!(normalize_to_monthly(Some(10.0), &Frequency::from_tag(Some("monthly"))), Some(10.0));
        assert_eq!(normalize_to_monthly(Some(10.0), &Frequency::from_tag(None)), Some(10.0));
    }

    #[test]
    fn test_absent_amount_ignores_frequency() {
        assert_eq!(normalize_to_monthly(None, &Frequency::Monthly), None);
        assert_eq!(normalize_to_monthly(None, &Frequency::Weekly), None);
    }

    #[test]
    fn test_unknown_frequency_passes_through() {
        let fortnightly = Frequency::from_tag(Some("fortnightly"));
        assert_eq!(fortnightly, Frequency::Other("fortnightly".to_string()));
        assert_eq!(normalize_to_monthly(Some(100.0), &fortnightly), Some(100.0));

        // matching is exact
        assert_eq!(normalize_to_monthly(Some(100.0), &Frequency::from_tag(Some("Yearly"))), Some(100.0));
    }

    #[test]
    fn test_monthly_is_idempotent() {
        for x in [0.0, 1.0, -12.75, 1234.5678, 1e12] {
            let once = normalize_to_monthly(Some(x), &Frequency::Monthly);
            assert_eq!(normalize_to_monthly(once, &Frequency::Monthly), Some(x));
        }
    }

    #[test]
    fn test_frequency_serde_round_trips_tag() {
        let weekly: Frequency = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(weekly, Frequency::Weekly);

        let unset: Frequency = serde_json::from_str("null").unwrap();
        assert_eq!(unset, Frequency::Unset);

        assert_eq!(serde_json::to_string(&Frequency::Yearly).unwrap(), "\"yearly\"");
    }
}
