//! Deferred records
//!
//! A record whose write or verification failed with a retryable error stays
//! hot and is parked here until its backoff elapses. Attempts accumulate
//! across passes; the orchestrator quarantines the record once they reach
//! the archival ceiling.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};
use strata_tier_core::RecordId;

/// Retry bookkeeping for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredEntry {
    /// Failed write/verify attempts so far
    pub attempts: u32,
    /// The most recent failure
    pub last_error: String,
    /// Skip the idempotent-replay shortcut on the next attempt
    pub force_rewrite: bool,
    /// Earliest time the next attempt may start
    pub retry_at: Instant,
}

/// Records waiting for their next archival attempt
#[derive(Debug, Default)]
pub struct DeferredRegistry {
    entries: Mutex<FxHashMap<RecordId, DeferredEntry>>,
}

impl DeferredRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt; the next one may start after `backoff`
    pub fn defer(
        &self,
        id: RecordId,
        attempts: u32,
        last_error: impl Into<String>,
        force_rewrite: bool,
        backoff: Duration,
    ) {
        let now = Instant::now();
        let entry = DeferredEntry {
            attempts,
            last_error: last_error.into(),
            force_rewrite,
            retry_at: now.checked_add(backoff).unwrap_or(now),
        };
        self.entries.lock().insert(id, entry);
    }

    /// Bookkeeping for `id`, if it has failed before
    pub fn get(&self, id: &RecordId) -> Option<DeferredEntry> {
        self.entries.lock().get(id).cloned()
    }

    /// Whether `id` is still inside its backoff window
    pub fn is_waiting(&self, id: &RecordId) -> bool {
        self.entries
            .lock()
            .get(id)
            .is_some_and(|entry| entry.retry_at > Instant::now())
    }

    /// Forget `id` (archived or quarantined)
    pub fn remove(&self, id: &RecordId) -> Option<DeferredEntry> {
        self.entries.lock().remove(id)
    }

    /// Ids waiting for another attempt, sorted
    pub fn pending(&self) -> Vec<RecordId> {
        let mut ids: Vec<_> = self.entries.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of deferred records
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is deferred
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
