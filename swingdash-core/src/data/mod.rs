//! Market data: providers, caching wrappers and the ranking universe.

pub mod cached;
pub mod circuit_breaker;
pub mod csv_provider;
pub mod provider;
pub mod screener;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use cached::{CachedProvider, CachedSnapshotProvider};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_provider::CsvProvider;
pub use provider::{DataError, DataSource, Interval, Lookback, MarketDataProvider, Metadata};
pub use screener::{parse_screener_html, NullSnapshotProvider, ScreenerProvider, Snapshot, SnapshotProvider};
pub use synthetic::SyntheticProvider;
pub use universe::{Universe, UniverseEntry};
pub use yahoo::YahooProvider;

use crate::domain::Bar;
use chrono::Datelike;

/// Aggregate daily bars to the requested interval.
///
/// Weekly bars group by ISO week: first open, highest high, lowest low, last
/// close, summed volume, dated on the first session of the week.
pub(crate) fn resample(bars: Vec<Bar>, interval: Interval) -> Vec<Bar> {
    match interval {
        Interval::Daily => bars,
        Interval::Weekly => {
            let mut out: Vec<Bar> = Vec::new();
            let mut current_week = None;
            for bar in bars {
                let week = bar.date.iso_week();
                let key = (week.year(), week.week());
                match out.last_mut() {
                    Some(agg) if current_week == Some(key) => {
                        agg.high = agg.high.max(bar.high);
                        agg.low = agg.low.min(bar.low);
                        agg.close = bar.close;
                        agg.volume = agg.volume.saturating_add(bar.volume);
                    }
                    _ => {
                        current_week = Some(key);
                        out.push(bar);
                    }
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(y: i32, m: u32, d: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            open,
            high,
            low,
            close,
            volume: 100,
        }
    }

    #[test]
    fn daily_passes_through() {
        let bars = vec![bar(2024, 1, 1, 1.0, 2.0, 0.5, 1.5)];
        assert_eq!(resample(bars.clone(), Interval::Daily), bars);
    }

    #[test]
    fn weekly_aggregates_by_iso_week() {
        // Mon 2024-01-01 .. Wed 2024-01-03, then Mon 2024-01-08
        let bars = vec![
            bar(2024, 1, 1, 10.0, 12.0, 9.0, 11.0),
            bar(2024, 1, 2, 11.0, 15.0, 10.0, 14.0),
            bar(2024, 1, 3, 14.0, 14.5, 8.0, 13.0),
            bar(2024, 1, 8, 13.0, 13.5, 12.0, 12.5),
        ];
        let weekly = resample(bars, Interval::Weekly);
        assert_eq!(weekly.len(), 2);

        let first = weekly[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(first.open, 10.0);
        assert_eq!(first.high, 15.0);
        assert_eq!(first.low, 8.0);
        assert_eq!(first.close, 13.0);
        assert_eq!(first.volume, 300);

        assert_eq!(weekly[1].close, 12.5);
        assert_eq!(weekly[1].volume, 100);
    }

    #[test]
    fn weekly_of_empty_is_empty() {
        assert!(resample(Vec::new(), Interval::Weekly).is_empty());
    }
}
