//! Offline provider over a directory of CSV exports.
//!
//! `{dir}/{SYMBOL}.csv` holds daily bars with a `Date,Open,High,Low,Close,Volume`
//! header (extra columns such as `Adj Close` are ignored). An optional
//! `{dir}/{SYMBOL}.json` holds flat metadata. A missing file means an unknown
//! symbol and yields an empty result.

use super::provider::{DataError, Interval, Lookback, MarketDataProvider, Metadata};
use super::resample;
use crate::domain::Bar;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date", alias = "Datetime")]
    date: String,
    #[serde(rename = "Open", alias = "open")]
    open: String,
    #[serde(rename = "High", alias = "high")]
    high: String,
    #[serde(rename = "Low", alias = "low")]
    low: String,
    #[serde(rename = "Close", alias = "close")]
    close: String,
    #[serde(rename = "Volume", alias = "volume", default)]
    volume: String,
}

/// Unparseable prices become NaN so the bar is dropped during cleaning.
fn price(field: &str) -> f64 {
    field.trim().parse().unwrap_or(f64::NAN)
}

fn volume(field: &str) -> u64 {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map_or(0, |v| v as u64)
}

fn parse_date(field: &str) -> Option<NaiveDate> {
    let field = field.trim();
    // "2024-06-03" or "2024-06-03 00:00:00+05:30"
    let day = field.get(..10).unwrap_or(field);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.{ext}"))
    }

    /// Every bar in the file, in file order.
    pub fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::Io(format!("open {}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for (idx, record) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "{} line {}: {e}",
                    path.display(),
                    idx + 2
                ))
            })?;
            let Some(date) = parse_date(&row.date) else {
                tracing::debug!(path = %path.display(), line = idx + 2, "skipping row with bad date");
                continue;
            };
            bars.push(Bar {
                date,
                open: price(&row.open),
                high: price(&row.high),
                low: price(&row.low),
                close: price(&row.close),
                volume: volume(&row.volume),
            });
        }
        Ok(bars)
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(symbol, "csv");
        if !path.exists() {
            tracing::debug!(symbol, path = %path.display(), "no CSV file");
            return Ok(Vec::new());
        }

        let mut bars = Self::read_bars(&path)?;
        bars.sort_by_key(|b| b.date);
        // The window is anchored on the newest bar in the file, not today.
        if let Some(last) = bars.last().map(|b| b.date) {
            let start = lookback.start_date(last);
            bars.retain(|b| b.date > start);
        }
        Ok(resample(bars, interval))
    }

    fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError> {
        let path = self.path_for(symbol, "json");
        if !path.exists() {
            return Ok(Metadata::new());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| DataError::Io(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&content).map_err(|e| {
            DataError::ResponseFormatChanged(format!("parse {}: {e}", path.display()))
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-06-03,100.0,105.0,99.0,104.0,104.0,1000
2024-06-05,102.0,106.0,101.0,103.5,103.5,1500
2024-06-04,null,null,null,null,null,null
2024-06-06 00:00:00+05:30,103.5,107.0,103.0,106.0,106.0,2000
";

    fn provider_with(files: &[(&str, &str)]) -> (tempfile::TempDir, CsvProvider) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let provider = CsvProvider::new(dir.path());
        (dir, provider)
    }

    #[test]
    fn reads_sorted_bars() {
        let (_dir, p) = provider_with(&[("INFY.NS.csv", SAMPLE)]);
        let bars = p.fetch_history("INFY.NS", Lookback::Months(6), Interval::Daily).unwrap();
        assert_eq!(bars.len(), 4);
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
        assert!(bars[1].is_void());
        assert_eq!(bars[3].close, 106.0);
        assert_eq!(bars[3].volume, 2000);
    }

    #[test]
    fn lookback_anchored_on_last_bar() {
        let (_dir, p) = provider_with(&[("INFY.NS.csv", SAMPLE)]);
        let bars = p.fetch_history("INFY.NS", Lookback::Days(2), Interval::Daily).unwrap();
        let dates: Vec<String> = bars.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-06-05", "2024-06-06"]);
    }

    #[test]
    fn missing_symbol_is_empty() {
        let (_dir, p) = provider_with(&[]);
        assert!(p.fetch_history("NOPE", Lookback::Months(6), Interval::Daily).unwrap().is_empty());
        assert!(p.fetch_metadata("NOPE").unwrap().is_empty());
        assert!(p.is_available());
    }

    #[test]
    fn reads_metadata_json() {
        let (_dir, p) = provider_with(&[(
            "TCS.NS.json",
            r#"{"longName": "Tata Consultancy Services", "trailingPE": 29.5}"#,
        )]);
        let meta = p.fetch_metadata("TCS.NS").unwrap();
        assert_eq!(meta["trailingPE"], serde_json::json!(29.5));
    }

    #[test]
    fn malformed_metadata_is_error() {
        let (_dir, p) = provider_with(&[("BAD.json", "{not json")]);
        assert!(p.fetch_metadata("BAD").is_err());
    }

    #[test]
    fn lowercase_headers() {
        let (_dir, p) = provider_with(&[(
            "X.csv",
            "date,open,high,low,close,volume\n2024-01-02,1,2,0.5,1.5,10\n",
        )]);
        let bars = p.fetch_history("X", Lookback::Years(1), Interval::Daily).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].high, 2.0);
    }
}
