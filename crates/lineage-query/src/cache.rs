//! Query result cache with epoch-based invalidation.
//!
//! Entries are keyed by a canonical query signature and stamped with the
//! epoch they were computed at. Every structural mutation advances the
//! epoch; an entry from an older epoch is treated as a miss and evicted
//! when it is next looked up. Eviction beyond that is least-recently-used.

use lru::LruCache;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Canonical query signature: operation name plus ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    op: &'static str,
    params: Vec<String>,
}

impl QueryKey {
    pub fn new(op: &'static str, params: Vec<String>) -> Self {
        Self { op, params }
    }

    pub fn op(&self) -> &'static str {
        self.op
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.op, self.params.join(", "))
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    epoch: u64,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub stale_evictions: u64,
    pub entries: usize,
    pub epoch: u64,
    pub hit_rate: f64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    stale_evictions: AtomicU64,
}

pub struct QueryCache {
    entries: Mutex<LruCache<QueryKey, CacheEntry>>,
    epoch: AtomicU64,
    enabled: bool,
    counters: Counters,
}

impl QueryCache {
    pub fn new(capacity: usize, enabled: bool) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            epoch: AtomicU64::new(0),
            enabled,
            counters: Counters::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Invalidate every entry computed so far
    pub fn advance_epoch(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("Query cache epoch advanced to {}", epoch);
        epoch
    }

    /// Current-epoch value for `key`, if any
    pub fn get<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.enabled {
            return None;
        }
        let epoch = self.epoch();
        let mut entries = self.entries.lock();

        let stale = match entries.get(key) {
            Some(entry) if entry.epoch == epoch => {
                if let Some(value) = entry.value.downcast_ref::<T>() {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    trace!("Cache hit: {}", key);
                    return Some(value.clone());
                }
                false
            }
            Some(_) => true,
            None => false,
        };

        if stale {
            entries.pop(key);
            self.counters.stale_evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `value` as computed at `epoch`
    pub fn put<T>(&self, key: QueryKey, value: T, epoch: u64)
    where
        T: Send + Sync + 'static,
    {
        if !self.enabled || epoch != self.epoch() {
            return;
        }
        self.entries.lock().put(
            key,
            CacheEntry {
                value: Arc::new(value),
                epoch,
            },
        );
        self.counters.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Errors are returned as-is and never cached.
    pub fn get_or_compute<T, F>(&self, key: QueryKey, compute: F) -> lineage_core::Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> lineage_core::Result<T>,
    {
        if let Some(value) = self.get::<T>(&key) {
            return Ok(value);
        }
        let epoch = self.epoch();
        let value = compute()?;
        self.put(key, value.clone(), epoch);
        Ok(value)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn statistics(&self) -> CacheStatistics {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStatistics {
            hits,
            misses,
            inserts: self.counters.inserts.load(Ordering::Relaxed),
            stale_evictions: self.counters.stale_evictions.load(Ordering::Relaxed),
            entries: self.len(),
            epoch: self.epoch(),
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(1000, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(op: &'static str, p: &str) -> QueryKey {
        QueryKey::new(op, vec![p.to_string()])
    }

    #[test]
    fn test_hit_after_compute() {
        let cache = QueryCache::new(8, true);
        let mut calls = 0;
        for _ in 0..3 {
            let v: Vec<u32> = cache
                .get_or_compute(key("parents", "I1"), || {
                    calls += 1;
                    Ok(vec![1, 2])
                })
                .unwrap();
            assert_eq!(v, vec![1, 2]);
        }
        assert_eq!(calls, 1);
        let stats = cache.statistics();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
    }

    #[test]
    fn test_epoch_invalidates_old_entries() {
        let cache = QueryCache::new(8, true);
        let epoch = cache.epoch();
        cache.put(key("children", "I1"), 5u32, epoch);
        assert_eq!(cache.get::<u32>(&key("children", "I1")), Some(5));

        cache.advance_epoch();
        assert_eq!(cache.get::<u32>(&key("children", "I1")), None);
        assert_eq!(cache.statistics().stale_evictions, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_from_previous_epoch_is_dropped() {
        let cache = QueryCache::new(8, true);
        let epoch = cache.epoch();
        cache.advance_epoch();
        cache.put(key("filter", "x"), 1u8, epoch);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_capacity() {
        let cache = QueryCache::new(2, true);
        let epoch = cache.epoch();
        cache.put(key("a", "1"), 1u8, epoch);
        cache.put(key("a", "2"), 2u8, epoch);
        cache.put(key("a", "3"), 3u8, epoch);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get::<u8>(&key("a", "1")), None);
        assert_eq!(cache.get::<u8>(&key("a", "3")), Some(3));
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let cache = QueryCache::new(8, false);
        let mut calls = 0;
        for _ in 0..2 {
            let _: u8 = cache
                .get_or_compute(key("a", "1"), || {
                    calls += 1;
                    Ok(1)
                })
                .unwrap();
        }
        assert_eq!(calls, 2);
        assert_eq!(cache.statistics().hits, 0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = QueryCache::new(8, true);
        let err = cache.get_or_compute::<u8, _>(key("a", "1"), || {
            Err(lineage_core::LineageError::invalid_parameter("bad"))
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_display() {
        let k = QueryKey::new("ancestors", vec!["I1".into(), "2".into()]);
        assert_eq!(k.to_string(), "ancestors(I1, 2)");
        assert_eq!(k.op(), "ancestors");
    }
}
