//! TTL memoization wrappers around providers.
//!
//! Successful results (including empty ones) are cached; errors are not, so a
//! transient failure is retried on the next call.

use super::provider::{DataError, Interval, Lookback, MarketDataProvider, Metadata};
use super::screener::{Snapshot, SnapshotProvider};
use crate::cache::{Clock, TtlCache};
use crate::domain::Bar;
use std::sync::Arc;
use std::time::Duration;

type HistoryKey = (String, Lookback, Interval);

pub struct CachedProvider<P> {
    inner: P,
    history: TtlCache<HistoryKey, Vec<Bar>>,
    metadata: TtlCache<String, Metadata>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            history: TtlCache::new(ttl, clock.clone()),
            metadata: TtlCache::new(ttl, clock),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn clear(&self) {
        self.history.clear();
        self.metadata.clear();
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch_history(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<Vec<Bar>, DataError> {
        let key = (symbol.to_string(), lookback, interval);
        self.history.try_get_or_insert_with(key, || {
            self.inner.fetch_history(symbol, lookback, interval)
        })
    }

    fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError> {
        self.metadata
            .try_get_or_insert_with(symbol.to_string(), || self.inner.fetch_metadata(symbol))
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

pub struct CachedSnapshotProvider<S> {
    inner: S,
    snapshots: TtlCache<String, Snapshot>,
}

impl<S: SnapshotProvider> CachedSnapshotProvider<S> {
    pub fn new(inner: S, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            snapshots: TtlCache::new(ttl, clock),
        }
    }
}

impl<S: SnapshotProvider> SnapshotProvider for CachedSnapshotProvider<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch_snapshot(&self, code: &str) -> Snapshot {
        self.snapshots
            .get_or_insert_with(code.to_string(), || self.inner.fetch_snapshot(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::indicators::make_bars;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MarketDataProvider for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch_history(&self, _: &str, _: Lookback, _: Interval) -> Result<Vec<Bar>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DataError::NetworkUnreachable("down".into()))
            } else {
                Ok(make_bars(&[1.0, 2.0]))
            }
        }

        fn fetch_metadata(&self, _: &str) -> Result<Metadata, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Metadata::new())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    struct CountingSnapshots(AtomicUsize);

    impl SnapshotProvider for CountingSnapshots {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch_snapshot(&self, code: &str) -> Snapshot {
            self.0.fetch_add(1, Ordering::SeqCst);
            Snapshot::from([("code".to_string(), code.to_string())])
        }
    }

    #[test]
    fn history_cached_per_key_until_expiry() {
        let clock = Arc::new(ManualClock::new());
        let p = CachedProvider::new(Counting::default(), Duration::from_secs(900), clock.clone());

        p.fetch_history("A", Lookback::Months(6), Interval::Daily).unwrap();
        p.fetch_history("A", Lookback::Months(6), Interval::Daily).unwrap();
        assert_eq!(p.inner().calls.load(Ordering::SeqCst), 1);

        p.fetch_history("A", Lookback::Days(5), Interval::Daily).unwrap();
        assert_eq!(p.inner().calls.load(Ordering::SeqCst), 2);

        clock.advance(Duration::from_secs(901));
        p.fetch_history("A", Lookback::Months(6), Interval::Daily).unwrap();
        assert_eq!(p.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn errors_are_retried() {
        let clock = Arc::new(ManualClock::new());
        let inner = Counting {
            fail: true,
            ..Default::default()
        };
        let p = CachedProvider::new(inner, Duration::from_secs(900), clock);
        assert!(p.fetch_history("A", Lookback::Days(5), Interval::Daily).is_err());
        assert!(p.fetch_history("A", Lookback::Days(5), Interval::Daily).is_err());
        assert_eq!(p.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn snapshots_cached() {
        let clock = Arc::new(ManualClock::new());
        let p = CachedSnapshotProvider::new(
            CountingSnapshots(AtomicUsize::new(0)),
            Duration::from_secs(3600),
            clock.clone(),
        );
        assert_eq!(p.fetch_snapshot("TCS")["code"], "TCS");
        p.fetch_snapshot("TCS");
        assert_eq!(p.inner.0.load(Ordering::SeqCst), 1);
        clock.advance(Duration::from_secs(3600));
        p.fetch_snapshot("TCS");
        assert_eq!(p.inner.0.load(Ordering::SeqCst), 2);
    }
}
