//! Deterministic synthetic provider for demos and offline development.
//!
//! Each symbol gets its own random walk seeded by a BLAKE3 hash of the symbol,
//! so the same symbol always yields the same bars. The walk starts at a fixed
//! origin date and every window is a slice of it, which keeps the latest close
//! identical whatever lookback is requested. These are clearly fake and carry
//! "(synthetic)" in their metadata name.

use super::provider::{DataError, Interval, Lookback, MarketDataProvider, Metadata};
use super::resample;
use crate::domain::Bar;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

fn origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn rng_for(symbol: &str, salt: &str) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(symbol.as_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

pub struct SyntheticProvider {
    end: NaiveDate,
}

impl SyntheticProvider {
    /// Walks end on `end` (inclusive).
    pub fn new(end: NaiveDate) -> Self {
        Self { end }
    }

    /// Walks end today (UTC).
    pub fn today() -> Self {
        Self::new(chrono::Utc::now().date_naive())
    }

    /// Weekday bars from the origin through `self.end`.
    pub fn walk(&self, symbol: &str) -> Vec<Bar> {
        let mut rng = rng_for(symbol, "bars");
        let mut price = rng.gen_range(50.0..2500.0_f64);
        let drift = rng.gen_range(-0.0005..0.0008_f64);

        let mut bars = Vec::new();
        let mut current = origin();
        while current <= self.end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += Duration::days(1);
                continue;
            }

            let daily_return: f64 = drift + rng.gen_range(-0.025..0.025);
            let open = price * (1.0 + rng.gen_range(-0.005..0.005));
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.012));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.012));
            let volume = rng.gen_range(200_000..8_000_000u64);

            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += Duration::days(1);
        }
        bars
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<Vec<Bar>, DataError> {
        if symbol.is_empty() {
            return Ok(Vec::new());
        }
        let start = lookback.start_date(self.end);
        let mut bars = self.walk(symbol);
        bars.retain(|b| b.date > start);
        Ok(resample(bars, interval))
    }

    fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError> {
        if symbol.is_empty() {
            return Ok(Metadata::new());
        }
        let mut rng = rng_for(symbol, "metadata");
        let domestic = symbol.ends_with(".NS") || symbol.ends_with(".BO");
        let currency = if domestic { "INR" } else { "USD" };
        let market_cap = rng.gen_range(1e10..2e13_f64);
        let fields = json!({
            "longName": format!("{symbol} (synthetic)"),
            "sector": "Synthetic",
            "currency": currency,
            "marketCap": market_cap,
            "enterpriseValue": market_cap * rng.gen_range(0.9..1.3),
            "trailingPE": rng.gen_range(5.0..60.0),
            "forwardPE": rng.gen_range(5.0..50.0),
            "priceToBook": rng.gen_range(0.5..15.0),
            "returnOnEquity": rng.gen_range(-0.05..0.4),
            "debtToEquity": rng.gen_range(0.0..250.0),
            "profitMargins": rng.gen_range(-0.05..0.35),
            "revenueGrowth": rng.gen_range(-0.1..0.3),
            "freeCashflow": market_cap * rng.gen_range(-0.02..0.08),
            "totalCash": market_cap * rng.gen_range(0.01..0.2),
            "totalDebt": market_cap * rng.gen_range(0.0..0.5),
            "beta": rng.gen_range(0.4..1.8),
        });
        serde_json::from_value(fields).map_err(|e| DataError::Other(e.to_string()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 6, 28).unwrap())
    }

    #[test]
    fn deterministic_per_symbol() {
        let p = provider();
        let a = p.fetch_history("AAPL", Lookback::Months(6), Interval::Daily).unwrap();
        let b = p.fetch_history("AAPL", Lookback::Months(6), Interval::Daily).unwrap();
        let c = p.fetch_history("MSFT", Lookback::Months(6), Interval::Daily).unwrap();
        assert_eq!(a, b);
        assert_ne!(a[0].close, c[0].close);
    }

    #[test]
    fn windows_share_latest_bar() {
        let p = provider();
        let long = p.fetch_history("TCS.NS", Lookback::Months(6), Interval::Daily).unwrap();
        let short = p.fetch_history("TCS.NS", Lookback::Days(5), Interval::Daily).unwrap();
        assert!(long.len() > 100);
        assert!(short.len() >= 2 && short.len() <= 5);
        assert_eq!(long.last(), short.last());
    }

    #[test]
    fn bars_are_sane_weekdays() {
        let bars = provider()
            .fetch_history("INFY.NS", Lookback::Months(3), Interval::Daily)
            .unwrap();
        for bar in &bars {
            assert!(bar.is_sane(), "{bar:?}");
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn metadata_currency_follows_suffix() {
        let p = provider();
        let inr = p.fetch_metadata("RELIANCE.NS").unwrap();
        let usd = p.fetch_metadata("AAPL").unwrap();
        assert_eq!(inr["currency"], json!("INR"));
        assert_eq!(usd["currency"], json!("USD"));
        assert_eq!(p.fetch_metadata("AAPL").unwrap(), usd);
    }

    #[test]
    fn empty_symbol_is_empty() {
        let p = provider();
        assert!(p.fetch_history("", Lookback::Days(5), Interval::Daily).unwrap().is_empty());
    }
}
