//! Cleanup-retry queue
//!
//! Holds records whose cold copy is verified but whose hot delete failed.
//! The cold copy is already authoritative, so these are never retried as
//! archival and never quarantined; the queue only exists so the leftover
//! hot copy does not linger forever. Each pass drains it first.

use parking_lot::Mutex;
use std::collections::VecDeque;
use strata_tier_core::{RecordId, Timestamp};

/// A hot copy waiting to be deleted
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupEntry {
    /// Record whose hot copy is outstanding
    pub record_id: RecordId,
    /// `updated_at` of the archived snapshot; the delete is conditional on it
    pub archived_version: Timestamp,
    /// Failed delete attempts so far
    pub attempts: u32,
    /// Most recent failure
    pub last_error: String,
}

/// FIFO of outstanding hot deletes
#[derive(Debug, Default)]
pub struct CleanupQueue {
    entries: Mutex<VecDeque<CleanupEntry>>,
}

impl CleanupQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, merging with an existing one for the same record
    pub fn push(&self, entry: CleanupEntry) {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|e| e.record_id == entry.record_id) {
            Some(existing) => {
                existing.archived_version = entry.archived_version;
                existing.attempts += entry.attempts;
                existing.last_error = entry.last_error;
            }
            None => entries.push_back(entry),
        }
    }

    /// Take every entry, leaving the queue empty
    pub fn drain(&self) -> Vec<CleanupEntry> {
        self.entries.lock().drain(..).collect()
    }

    /// Ids currently waiting, in queue order
    pub fn pending(&self) -> Vec<RecordId> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.record_id.clone())
            .collect()
    }

    /// Number of outstanding deletes
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is outstanding
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
