//! Per-record migration state machine
//!
//! ```text
//!                ┌───────── failed attempt ─────────┐
//!                ▼                                  │
//! Hot ─► PendingArchive ─► Writing ─► Verifying ─► Verified ─► Deleted
//!  ▲             │            │           │            │
//!  │             └────────────┴───────────┴─► Quarantined
//!  ├── deferred to a later pass ◄─┘                   │
//!  └────────────── modified during migration ◄────────┘
//! ```
//!
//! `Hot`, `Deleted` and `Quarantined` are the only states a record rests
//! in between passes. Everything else exists only while one migration is
//! running.

use std::fmt;
use strata_tier_core::{Error, RecordId};
use tracing::debug;

/// Where a record is in its migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationState {
    /// Lives in the hot tier only
    Hot,
    /// Selected for archival, about to be written
    PendingArchive,
    /// Artifact being written to the cold tier
    Writing,
    /// Artifact being read back and checked
    Verifying,
    /// Cold copy confirmed; hot copy may go
    Verified,
    /// Hot copy removed; the cold copy is authoritative
    Deleted,
    /// Gave up; hot copy untouched, excluded until cleared
    Quarantined,
}

impl MigrationState {
    /// Whether a record may stay in this state between passes
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            MigrationState::Hot | MigrationState::Deleted | MigrationState::Quarantined
        )
    }

    /// Whether `next` is a legal successor
    pub fn can_transition_to(&self, next: MigrationState) -> bool {
        use MigrationState::*;
        matches!(
            (self, next),
            (Hot, PendingArchive)
                | (PendingArchive, Writing)
                | (PendingArchive, Quarantined)
                | (PendingArchive, Hot)
                | (Writing, Verifying)
                | (Writing, PendingArchive)
                | (Writing, Quarantined)
                | (Verifying, Verified)
                | (Verifying, PendingArchive)
                | (Verifying, Quarantined)
                | (Verified, Deleted)
                | (Verified, Hot)
        )
    }

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationState::Hot => "hot",
            MigrationState::PendingArchive => "pending_archive",
            MigrationState::Writing => "writing",
            MigrationState::Verifying => "verifying",
            MigrationState::Verified => "verified",
            MigrationState::Deleted => "deleted",
            MigrationState::Quarantined => "quarantined",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record's progress through a migration
///
/// Lives for the duration of the migration; only its outcome survives,
/// in the pass report or the quarantine registry.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationAttempt {
    /// Record being migrated
    pub record_id: RecordId,
    /// Current state
    pub state: MigrationState,
    /// Failed write/verify attempts so far
    pub attempt_count: u32,
    /// Most recent failure
    pub last_error: Option<Error>,
}

impl MigrationAttempt {
    /// Start tracking `record_id` in the `Hot` state
    pub fn new(record_id: RecordId) -> Self {
        MigrationAttempt {
            record_id,
            state: MigrationState::Hot,
            attempt_count: 0,
            last_error: None,
        }
    }

    /// Move to `next`
    pub fn advance(&mut self, next: MigrationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal migration transition {} -> {}",
            self.state,
            next
        );
        debug!(record_id = %self.record_id, from = %self.state, to = %next, "migration transition");
        self.state = next;
    }

    /// Count a failed attempt and remember why
    pub fn record_failure(&mut self, error: Error) {
        self.attempt_count += 1;
        self.last_error = Some(error);
    }
}
