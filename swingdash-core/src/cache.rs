//! In-memory TTL memoization.
//!
//! Entries expire a fixed duration after insertion. Time comes from an
//! injected [`Clock`], so tests drive expiry with [`ManualClock`] instead of
//! sleeping. Nothing is persisted.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live value for `key`; an expired entry is evicted and reported as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, sweeping out every entry that has expired.
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut entries = self.entries();
        entries.retain(|_, e| now < e.expires_at);
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Read-through: return the live value or compute, store and return a new one.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Read-through for fallible computations; errors are returned and not cached.
    pub fn try_get_or_insert_with<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) -> Option<V> {
        self.entries().remove(key).map(|e| e.value)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }

    /// Entry count, including entries that expired but were not yet evicted.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn cache(ttl_secs: u64) -> (Arc<ManualClock>, TtlCache<String, u32>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), clock.clone());
        (clock, cache)
    }

    #[test]
    fn hit_before_expiry_miss_after() {
        let (clock, cache) = cache(60);
        cache.insert("a".into(), 1);
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(&"a".into()), Some(1));
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"a".into()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn read_through_computes_once() {
        let (_clock, cache) = cache(60);
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            7
        };
        assert_eq!(cache.get_or_insert_with("k".into(), compute), 7);
        assert_eq!(cache.get_or_insert_with("k".into(), compute), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn read_through_recomputes_after_expiry() {
        let (clock, cache) = cache(10);
        assert_eq!(cache.get_or_insert_with("k".into(), || 1), 1);
        clock.advance(Duration::from_secs(11));
        assert_eq!(cache.get_or_insert_with("k".into(), || 2), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let (_clock, cache) = cache(60);
        let err: Result<u32, &str> = cache.try_get_or_insert_with("k".into(), || Err("boom"));
        assert_eq!(err, Err("boom"));
        assert!(cache.is_empty());
        let ok: Result<u32, &str> = cache.try_get_or_insert_with("k".into(), || Ok(3));
        assert_eq!(ok, Ok(3));
        assert_eq!(cache.get(&"k".into()), Some(3));
    }

    #[test]
    fn insert_sweeps_keys_never_read_again() {
        let (clock, cache) = cache(10);
        for key in ["a", "b", "c"] {
            cache.insert(key.into(), 1);
        }
        clock.advance(Duration::from_secs(4));
        cache.insert("d".into(), 2);
        assert_eq!(cache.len(), 4);

        clock.advance(Duration::from_secs(7));
        cache.insert("e".into(), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"d".into()), Some(2));
        assert_eq!(cache.get(&"a".into()), None);
    }

    #[test]
    fn invalidate_and_purge() {
        let (clock, cache) = cache(10);
        cache.insert("a".into(), 1);
        cache.insert("b".into(), 2);
        assert_eq!(cache.invalidate(&"a".into()), Some(1));
        clock.advance(Duration::from_secs(5));
        cache.insert("c".into(), 3);
        clock.advance(Duration::from_secs(6));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
