//! Market-data provider trait and structured error types.
//!
//! The `MarketDataProvider` trait abstracts over data sources (Yahoo Finance,
//! CSV files, synthetic series) so the pipeline can swap implementations and
//! mock them in tests.

use crate::domain::Bar;
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Flat company metadata as delivered by a provider (Yahoo `info`-style keys).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("data error: {0}")]
    Other(String),
}

/// How far back a history request reaches from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    Days(u32),
    Months(u32),
    Years(u32),
}

impl Lookback {
    /// Yahoo `range` query value: `5d`, `6mo`, `1y`.
    pub fn range_param(&self) -> String {
        match self {
            Lookback::Days(n) => format!("{n}d"),
            Lookback::Months(n) => format!("{n}mo"),
            Lookback::Years(n) => format!("{n}y"),
        }
    }

    /// First calendar date covered when the window ends on `end`.
    pub fn start_date(&self, end: NaiveDate) -> NaiveDate {
        match *self {
            Lookback::Days(n) => end - Duration::days(i64::from(n)),
            Lookback::Months(n) => end.checked_sub_months(Months::new(n)).unwrap_or(NaiveDate::MIN),
            Lookback::Years(n) => end
                .with_year(end.year() - n as i32)
                .or_else(|| end.checked_sub_months(Months::new(12 * n)))
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.range_param())
    }
}

/// Bar sampling interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
}

impl Interval {
    pub fn param(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
        }
    }
}

/// Where bars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Yahoo,
    Csv,
    Synthetic,
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(DataSource::Yahoo),
            "csv" => Ok(DataSource::Csv),
            "synthetic" => Ok(DataSource::Synthetic),
            other => Err(format!(
                "unknown data source '{other}' (expected yahoo, csv or synthetic)"
            )),
        }
    }
}

/// Trait for market-data providers.
///
/// Unknown or delisted symbols should come back as `Ok` with an empty result
/// where the source allows it. Callers treat any `Err` the same as empty.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Chronological OHLCV bars for `symbol` over `lookback`.
    fn fetch_history(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<Vec<Bar>, DataError>;

    /// Flat company metadata for `symbol`.
    fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_history(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<Vec<Bar>, DataError> {
        (**self).fetch_history(symbol, lookback, interval)
    }

    fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError> {
        (**self).fetch_metadata(symbol)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
