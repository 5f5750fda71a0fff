//! Quarantine registry
//!
//! Records that exhausted their archival attempts, or that can never be
//! archived, are parked here. Scans skip them until an operator clears the
//! entry. The hot copy is never touched.

use chrono::Utc;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strata_tier_core::{RecordId, Timestamp};

/// Why and when a record was quarantined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineEntry {
    /// Quarantined record
    pub record_id: RecordId,
    /// Failed attempts before giving up
    pub attempts: u32,
    /// The failure that triggered quarantine
    pub last_error: String,
    /// When the record was quarantined
    pub quarantined_at: Timestamp,
}

impl QuarantineEntry {
    /// Entry stamped now
    pub fn new(record_id: RecordId, attempts: u32, last_error: impl Into<String>) -> Self {
        QuarantineEntry {
            record_id,
            attempts,
            last_error: last_error.into(),
            quarantined_at: Utc::now(),
        }
    }
}

/// Set of quarantined records, shared between passes
#[derive(Debug, Default)]
pub struct QuarantineRegistry {
    entries: RwLock<FxHashMap<RecordId, QuarantineEntry>>,
}

impl QuarantineRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry
    pub fn insert(&self, entry: QuarantineEntry) {
        self.entries.write().insert(entry.record_id.clone(), entry);
    }

    /// Whether `id` is quarantined
    pub fn contains(&self, id: &RecordId) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Re-admit `id` to future passes; returns the removed entry
    pub fn clear(&self, id: &RecordId) -> Option<QuarantineEntry> {
        self.entries.write().remove(id)
    }

    /// Seed the registry from persisted entries
    pub fn restore(&self, entries: impl IntoIterator<Item = QuarantineEntry>) {
        let mut map = self.entries.write();
        for entry in entries {
            map.insert(entry.record_id.clone(), entry);
        }
    }

    /// All entries, oldest first
    pub fn list(&self) -> Vec<QuarantineEntry> {
        let mut entries: Vec<_> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| {
            a.quarantined_at
                .cmp(&b.quarantined_at)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        entries
    }

    /// Number of quarantined records
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is quarantined
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
