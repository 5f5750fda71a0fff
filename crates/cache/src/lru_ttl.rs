//! LRU map with per-entry expiry
//!
//! Capacity pressure and age are independent: an entry leaves either when
//! it is the least recently used one and room is needed, or when its TTL
//! has elapsed, whichever comes first. Expired entries are dropped lazily
//! on lookup and counted as misses.

use crate::CacheStats;
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::trace;

struct Entry<V> {
    value: V,
    /// `None` when the TTL runs past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    stats: CacheStats,
}

/// Bounded, internally synchronized LRU cache with TTL
pub struct LruTtlCache<K: Hash + Eq, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> LruTtlCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Cache holding at most `capacity` entries (a capacity of 0 holds one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        LruTtlCache {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.inner.lock().entries.cap().get()
    }

    /// Live value for `key`, marking it most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = Instant::now();

        let expired = match inner.entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                let value = entry.value.clone();
                inner.stats.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.pop(key);
            inner.stats.expirations += 1;
            trace!("cache entry expired");
        }
        inner.stats.misses += 1;
        None
    }

    /// Insert or replace `key`, evicting the least recently used entry if full
    ///
    /// A TTL too large to represent never expires.
    pub fn insert(&self, key: K, value: V, ttl: Duration) {
        let mut inner = self.inner.lock();
        let expires_at = Instant::now().checked_add(ttl);
        if let Some((evicted, _)) = inner.entries.push(key.clone(), Entry { value, expires_at }) {
            if evicted != key {
                inner.stats.evictions += 1;
                trace!("cache entry evicted");
            }
        }
    }

    /// Drop `key`; returns whether it was present
    pub fn remove(&self, key: &K) -> bool {
        self.inner.lock().entries.pop(key).is_some()
    }

    /// Drop every entry, keeping the counters
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of entries held, expired ones not yet observed included
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            len: inner.entries.len(),
            ..inner.stats
        }
    }
}
