//! Number formatting and tolerant numeric coercion.
//!
//! Two display conventions for large monetary values:
//! - Domestic currency: Indian digit grouping scaled to crore (1e7) or lakh (1e5).
//! - Everything else: K/M/B/T magnitude suffixes.
//!
//! [`coerce_f64`] is the single entry point for turning loosely typed provider
//! values (numbers, numeric strings, percent strings, `{"raw": ..}` objects)
//! into `Option<f64>`. Anything it cannot read is `None`, never zero.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Display unit for domestic-currency magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomesticUnit {
    #[default]
    Crore,
    Lakh,
}

impl DomesticUnit {
    pub fn divisor(self) -> f64 {
        match self {
            DomesticUnit::Crore => 1e7,
            DomesticUnit::Lakh => 1e5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DomesticUnit::Crore => "Cr",
            DomesticUnit::Lakh => "L",
        }
    }
}

impl fmt::Display for DomesticUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomesticUnit::Crore => write!(f, "crore"),
            DomesticUnit::Lakh => write!(f, "lakh"),
        }
    }
}

impl FromStr for DomesticUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crore" | "cr" => Ok(DomesticUnit::Crore),
            "lakh" | "l" => Ok(DomesticUnit::Lakh),
            other => Err(format!("unknown unit '{other}' (expected crore or lakh)")),
        }
    }
}

/// Round to `decimals` places. Non-finite input is `None`.
pub fn round_to(value: f64, decimals: u32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let factor = 10f64.powi(decimals as i32);
    Some((value * factor).round() / factor)
}

/// Convert a fraction (0.153) to a rounded percentage (15.3).
pub fn ratio_to_pct(ratio: f64) -> Option<f64> {
    round_to(ratio * 100.0, 2)
}

/// Render a percentage value as `"{value}%"` with two decimals.
pub fn format_pct(pct: f64) -> String {
    format!("{pct:.2}%")
}

/// Two-decimal rendering, or `"NA"` for an absent value.
pub fn display_or_na(value: Option<f64>) -> String {
    match value.and_then(|v| round_to(v, 2)) {
        Some(v) => format!("{v:.2}"),
        None => "NA".to_string(),
    }
}

/// Indian digit grouping: last three integer digits, then groups of two.
///
/// `indian_grouping(123456789.5, 2)` is `"12,34,56,789.50"`.
pub fn indian_grouping(value: f64, decimals: usize) -> String {
    let negative = value < 0.0;
    let fixed = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let grouped = if integer.len() <= 3 {
        integer.to_string()
    } else {
        let (mut head, last_three) = integer.split_at(integer.len() - 3);
        let mut pairs = Vec::new();
        while head.len() > 2 {
            let (rest, pair) = head.split_at(head.len() - 2);
            pairs.push(pair);
            head = rest;
        }
        if !head.is_empty() {
            pairs.push(head);
        }
        pairs.reverse();
        format!("{},{last_three}", pairs.join(","))
    };

    let body = match fraction {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    };
    if negative {
        format!("-{body}")
    } else {
        body
    }
}

/// Domestic-currency value scaled by `unit` and Indian-grouped: `"1,234.56 Cr"`.
pub fn format_domestic(value: f64, unit: DomesticUnit, decimals: usize) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let scaled = value / unit.divisor();
    Some(format!("{} {}", indian_grouping(scaled, decimals), unit.label()))
}

const MAGNITUDES: [(f64, char); 4] = [(1e12, 'T'), (1e9, 'B'), (1e6, 'M'), (1e3, 'K')];

/// Humanize with the largest applicable K/M/B/T suffix; below 1e3 the plain value.
pub fn format_magnitude(value: f64, decimals: usize) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let abs = value.abs();
    for (threshold, suffix) in MAGNITUDES {
        if abs >= threshold {
            return Some(format!("{:.*}{suffix}", decimals, value / threshold));
        }
    }
    Some(format!("{:.*}", decimals, value))
}

/// Parse a magnitude-suffixed string (`"1.50M"`, `"-2.1b"`, `"1,250"`).
pub fn parse_magnitude(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let last = cleaned.chars().last()?;
    let (number, multiplier) = match last.to_ascii_uppercase() {
        'T' => (&cleaned[..cleaned.len() - 1], 1e12),
        'B' => (&cleaned[..cleaned.len() - 1], 1e9),
        'M' => (&cleaned[..cleaned.len() - 1], 1e6),
        'K' => (&cleaned[..cleaned.len() - 1], 1e3),
        _ => (cleaned.as_str(), 1.0),
    };
    let parsed: f64 = number.trim().parse().ok()?;
    let value = parsed * multiplier;
    value.is_finite().then_some(value)
}

/// Format a large monetary value for display in its own currency convention.
pub fn format_big_value(
    value: Option<f64>,
    currency: Option<&str>,
    unit: DomesticUnit,
    domestic_currency: &str,
) -> Option<String> {
    let value = value?;
    let is_domestic = currency.is_some_and(|c| c.eq_ignore_ascii_case(domestic_currency));
    if is_domestic {
        format_domestic(value, unit, 2)
    } else {
        format_magnitude(value, 2)
    }
}

/// Tolerant numeric coercion from a loosely typed provider value.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => coerce_str(s),
        Value::Object(map) => map.get("raw").and_then(coerce_f64),
        _ => None,
    }
}

/// Tolerant numeric coercion from text.
///
/// Accepts currency prefixes (`₹`, `$`, `Rs.`), grouping commas, a trailing `%`
/// (value kept as-is, `"12.5%"` → 12.5), a crore suffix (`"Cr."`) and K/M/B/T suffixes.
pub fn coerce_str(text: &str) -> Option<f64> {
    let mut s = text.trim();
    for prefix in ["Rs.", "Rs", "₹", "$", "€", "£"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }
    if s.is_empty() {
        return None;
    }
    if let Some(rest) = s.strip_suffix('%') {
        return parse_magnitude(rest);
    }
    for suffix in ["Cr.", "Cr"] {
        if let Some(rest) = s.strip_suffix(suffix) {
            return parse_magnitude(rest).map(|v| v * 1e7);
        }
    }
    parse_magnitude(s)
}

/// Non-empty string from a provider value.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
