//! Pass options and results

use super::quarantine::QuarantineEntry;
use std::time::Duration;
use strata_tier_core::{Error, Result, TieringConfig};

/// Parameters of one archival pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOptions {
    /// Records created longer ago than this are eligible
    pub threshold: Duration,
    /// Records fetched per scan page
    pub batch_size: usize,
    /// Concurrent migrations
    pub max_concurrency: usize,
}

impl PassOptions {
    /// Options taken from the configuration
    pub fn from_config(config: &TieringConfig) -> Self {
        PassOptions {
            threshold: config.archive_threshold(),
            batch_size: config.batch_size,
            max_concurrency: config.max_concurrency,
        }
    }

    /// Override the eligibility threshold
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Override the page size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Override the worker count
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if self.max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for PassOptions {
    fn default() -> Self {
        Self::from_config(&TieringConfig::default())
    }
}

/// What one archival pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// Eligible records returned by the scan
    pub scanned: u64,
    /// Records whose cold copy was verified this pass
    pub archived: u64,
    /// Records left hot: already quarantined, or modified during migration
    pub skipped: u64,
    /// Records left hot after a failed attempt, or still backing off
    pub deferred: u64,
    /// Records quarantined this pass
    pub quarantined: u64,
    /// Hot deletes still outstanding when the pass ended
    pub cleanup_pending: u64,
    /// Outstanding hot deletes completed this pass
    pub cleanup_completed: u64,
    /// Whether a stop request ended the pass early
    pub cancelled: bool,
    /// Wall time of the pass
    pub elapsed: Duration,
    /// Entries created by this pass
    pub quarantine: Vec<QuarantineEntry>,
}

impl PassReport {
    /// Human-readable one-liner
    pub fn summary(&self) -> String {
        format!(
            "Archival pass {}: {} scanned, {} archived, {} skipped, {} deferred, {} quarantined, cleanup {} done / {} pending, {:.2}ms",
            if self.cancelled { "stopped" } else { "complete" },
            self.scanned,
            self.archived,
            self.skipped,
            self.deferred,
            self.quarantined,
            self.cleanup_completed,
            self.cleanup_pending,
            self.elapsed.as_secs_f64() * 1000.0
        )
    }

    /// Whether anything needs operator attention
    pub fn has_issues(&self) -> bool {
        self.quarantined > 0 || self.cleanup_pending > 0
    }
}
