//! Read-through cache for retrieved records
//!
//! - [`RecordCache`]: the contract the retrieval router and record service use
//! - [`LruTtlCache`]: bounded map with least-recently-used eviction and a
//!   per-entry time-to-live
//! - [`CachedRecord`]: a record plus the moment it was fetched from the cold tier
//! - [`CacheStats`]: hit/miss/eviction counters

#![warn(missing_docs)]
#![warn(clippy::all)]

mod lru_ttl;

pub use lru_ttl::LruTtlCache;

use std::time::Duration;
use strata_tier_core::{Record, RecordId, Timestamp};

/// A record served from the cache
///
/// Only archived records are cached, so every entry remembers when it was
/// read back from the cold tier. That timestamp is what callers see as the
/// retrieval time on later cache hits.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRecord {
    /// The reassembled record
    pub record: Record,
    /// When the record was read from the cold tier
    pub retrieved_at: Timestamp,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing (expired entries included)
    pub misses: u64,
    /// Entries dropped to make room
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Entries currently held (expired ones not yet observed included)
    pub len: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache contract used by retrieval and by the CRUD surface
pub trait RecordCache: Send + Sync {
    /// Live entry for `id`, if any
    fn get(&self, id: &RecordId) -> Option<CachedRecord>;

    /// Insert or replace the entry for `id`, expiring after `ttl`
    fn set(&self, id: RecordId, entry: CachedRecord, ttl: Duration);

    /// Drop the entry for `id`; returns whether one was present
    fn invalidate(&self, id: &RecordId) -> bool;

    /// Drop every entry
    fn clear(&self);

    /// Current counters
    fn stats(&self) -> CacheStats;
}

impl RecordCache for LruTtlCache<RecordId, CachedRecord> {
    fn get(&self, id: &RecordId) -> Option<CachedRecord> {
        LruTtlCache::get(self, id)
    }

    fn set(&self, id: RecordId, entry: CachedRecord, ttl: Duration) {
        self.insert(id, entry, ttl)
    }

    fn invalidate(&self, id: &RecordId) -> bool {
        self.remove(id)
    }

    fn clear(&self) {
        LruTtlCache::clear(self)
    }

    fn stats(&self) -> CacheStats {
        LruTtlCache::stats(self)
    }
}
