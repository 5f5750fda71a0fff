//! Archival orchestrator
//!
//! A pass walks the hot tier in `(created_at, id)` order, collecting records
//! created before `now - threshold`, and migrates each one:
//!
//! ```text
//! validate ── permanent failure ──────────────────────────────► quarantine
//!    │
//!    ▼
//! compress + manifest ─► head(key) ── same hash ──┐
//!    │                                            │
//!    └──────────────► put(key) ───────────────────┤
//!                                                 ▼
//!                         get(key) + decompress + hash check
//!                            │ mismatch / failure: stays hot, deferred
//!                            ▼
//!                delete hot copy if unmodified ── failure ──► cleanup queue
//! ```
//!
//! The hot copy is deleted strictly after the cold copy is verified, so a
//! reader never observes a record as missing. A failed write or
//! verification leaves the record hot for the rest of the pass; a later
//! pass retries it once its backoff has elapsed, and the record is
//! quarantined when its attempts across passes reach `max_retry_attempts`.
//! Passes never overlap: a pass that finds another one running fails with
//! `PassInProgress`.

use super::cleanup::{CleanupEntry, CleanupQueue};
use super::deferred::DeferredRegistry;
use super::quarantine::{QuarantineEntry, QuarantineRegistry};
use super::report::{PassOptions, PassReport};
use super::state::{MigrationAttempt, MigrationState};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use strata_tier_cache::RecordCache;
use strata_tier_codec::Codec;
use strata_tier_concurrency::{RetryPolicy, StopSignal};
use strata_tier_core::{
    ArchiveManifest, ArtifactMetadata, Error, Record, RecordId, Result, StorageClassPolicy,
    Timestamp, TieringConfig,
};
use strata_tier_storage::{ColdKey, ColdStore, DeleteOutcome, HotStore, ScanCursor};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// How one record's migration ended
#[derive(Debug)]
enum RecordOutcome {
    Archived,
    Skipped,
    Deferred,
    Quarantined(QuarantineEntry),
}

/// Moves aged records from the hot tier to the cold tier
pub struct ArchivalOrchestrator {
    hot: Arc<dyn HotStore>,
    cold: Arc<dyn ColdStore>,
    cache: Arc<dyn RecordCache>,
    codec: Codec,
    io_retry: RetryPolicy,
    archival_retry: RetryPolicy,
    key_prefix: String,
    max_record_size: usize,
    storage_class: StorageClassPolicy,
    quarantine: QuarantineRegistry,
    deferred: DeferredRegistry,
    cleanup: CleanupQueue,
    pass_lock: Mutex<()>,
}

impl ArchivalOrchestrator {
    /// Orchestrator over the given stores
    pub fn new(
        hot: Arc<dyn HotStore>,
        cold: Arc<dyn ColdStore>,
        cache: Arc<dyn RecordCache>,
        config: &TieringConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(ArchivalOrchestrator {
            hot,
            cold,
            cache,
            codec: Codec::new(strata_tier_codec::DEFAULT_LEVEL, config.max_record_size),
            io_retry: RetryPolicy::for_io(config),
            archival_retry: RetryPolicy::for_archival(config),
            key_prefix: config.cold_key_prefix.clone(),
            max_record_size: config.max_record_size,
            storage_class: config.storage_class.clone(),
            quarantine: QuarantineRegistry::new(),
            deferred: DeferredRegistry::new(),
            cleanup: CleanupQueue::new(),
            pass_lock: Mutex::new(()),
        })
    }

    /// Quarantined records, oldest first
    pub fn quarantined(&self) -> Vec<QuarantineEntry> {
        self.quarantine.list()
    }

    /// Re-admit a quarantined record to future passes
    pub fn clear_quarantine(&self, id: &RecordId) -> Option<QuarantineEntry> {
        let entry = self.quarantine.clear(id);
        if entry.is_some() {
            info!(record_id = %id, "quarantine cleared");
        }
        entry
    }

    /// Seed the quarantine registry (entries persisted by a previous process)
    pub fn restore_quarantine(&self, entries: impl IntoIterator<Item = QuarantineEntry>) {
        self.quarantine.restore(entries);
    }

    /// Records waiting for another archival attempt after a failure
    pub fn deferred(&self) -> Vec<RecordId> {
        self.deferred.pending()
    }

    /// Records whose hot delete is still outstanding
    pub fn pending_cleanup(&self) -> Vec<RecordId> {
        self.cleanup.pending()
    }

    /// Whether a pass is currently running
    pub fn is_running(&self) -> bool {
        self.pass_lock.try_lock().is_err()
    }

    /// Run one archival pass
    ///
    /// Per-record failures never abort the pass; they end up as retries,
    /// quarantine entries or cleanup entries in the report. A failure to
    /// scan the hot tier does abort it, which is safe: the next pass
    /// rescans whatever is still eligible.
    pub async fn run_pass(&self, options: &PassOptions, stop: &StopSignal) -> Result<PassReport> {
        let _running = self.pass_lock.try_lock().map_err(|_| Error::PassInProgress)?;
        options.validate()?;

        let started = Instant::now();
        let now = Utc::now();
        let threshold = chrono::Duration::from_std(options.threshold)
            .map_err(|e| Error::Config(format!("archive threshold out of range: {}", e)))?;
        let cutoff = now - threshold;

        info!(
            %cutoff,
            batch_size = options.batch_size,
            max_concurrency = options.max_concurrency,
            "archival pass starting"
        );

        let mut report = PassReport {
            cleanup_completed: self.drain_cleanup().await,
            ..Default::default()
        };

        let mut cursor: Option<ScanCursor> = None;
        loop {
            if stop.is_stopped() {
                report.cancelled = true;
                break;
            }

            let page = self
                .io_retry
                .run("hot.scan", || {
                    self.hot
                        .scan_older_than(cutoff, cursor.as_ref(), options.batch_size)
                })
                .await?;

            let mut candidates = Vec::with_capacity(page.records.len());
            for record in page.records {
                report.scanned += 1;
                if self.quarantine.contains(&record.id) {
                    debug!(record_id = %record.id, "quarantined, skipping");
                    report.skipped += 1;
                } else if self.deferred.is_waiting(&record.id) {
                    debug!(record_id = %record.id, "backing off after failed attempt");
                    report.deferred += 1;
                } else {
                    candidates.push(record);
                }
            }

            let outcomes: Vec<RecordOutcome> = stream::iter(candidates)
                .take_while(|_| futures::future::ready(!stop.is_stopped()))
                .map(|record| self.migrate(record, now))
                .buffer_unordered(options.max_concurrency)
                .collect()
                .await;

            for outcome in outcomes {
                match outcome {
                    RecordOutcome::Archived => report.archived += 1,
                    RecordOutcome::Skipped => report.skipped += 1,
                    RecordOutcome::Deferred => report.deferred += 1,
                    RecordOutcome::Quarantined(entry) => {
                        report.quarantined += 1;
                        report.quarantine.push(entry);
                    }
                }
            }

            if stop.is_stopped() {
                report.cancelled = true;
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        report.cleanup_pending = self.cleanup.len() as u64;
        report.elapsed = started.elapsed();
        info!("{}", report.summary());
        Ok(report)
    }

    /// Retry outstanding hot deletes; returns how many completed
    async fn drain_cleanup(&self) -> u64 {
        let mut completed = 0;
        for mut entry in self.cleanup.drain() {
            let result = self
                .io_retry
                .run("hot.delete", || {
                    self.hot
                        .delete_if_unmodified(&entry.record_id, entry.archived_version)
                })
                .await;

            match result {
                Ok(DeleteOutcome::Deleted) | Ok(DeleteOutcome::Missing) => {
                    self.cache.invalidate(&entry.record_id);
                    debug!(record_id = %entry.record_id, "outstanding hot delete completed");
                    completed += 1;
                }
                Ok(DeleteOutcome::Modified) => {
                    // Updated after archival: the hot copy is live again and
                    // the next pass archives the new version.
                    debug!(record_id = %entry.record_id, "hot copy modified since archival, dropping cleanup");
                }
                Err(e) => {
                    entry.attempts += 1;
                    entry.last_error = e.to_string();
                    error!(
                        record_id = %entry.record_id,
                        attempts = entry.attempts,
                        error = %e,
                        "hot delete still failing, keeping in cleanup queue"
                    );
                    self.cleanup.push(entry);
                }
            }
        }
        completed
    }

    /// Drive one record through the state machine
    ///
    /// One write/verify attempt per pass. A retryable failure leaves the
    /// record hot and defers it; its attempt count carries over.
    async fn migrate(&self, record: Record, now: Timestamp) -> RecordOutcome {
        let mut attempt = MigrationAttempt::new(record.id.clone());
        attempt.advance(MigrationState::PendingArchive);

        if let Err(e) = record.validate(self.max_record_size) {
            attempt.record_failure(e);
            self.deferred.remove(&record.id);
            return self.quarantine_record(attempt);
        }

        let previous = self.deferred.get(&record.id);
        let force_rewrite = previous.as_ref().is_some_and(|entry| entry.force_rewrite);
        attempt.attempt_count = previous.map_or(0, |entry| entry.attempts);

        let key = ColdKey::for_record(&self.key_prefix, &record.id);
        if let Err(e) = self
            .write_and_verify(&record, &key, now, force_rewrite, &mut attempt)
            .await
        {
            let retryable = e.is_retryable();
            let rewrite = matches!(e, Error::ChecksumMismatch { .. });
            attempt.record_failure(e);
            if !retryable || attempt.attempt_count >= self.archival_retry.max_attempts() {
                self.deferred.remove(&record.id);
                return self.quarantine_record(attempt);
            }

            let delay = self.archival_retry.backoff(attempt.attempt_count - 1);
            let reason = attempt
                .last_error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            warn!(
                record_id = %record.id,
                attempt = attempt.attempt_count,
                retry_in_ms = delay.as_millis() as u64,
                error = %reason,
                "archival attempt failed, record stays hot"
            );
            self.deferred
                .defer(record.id.clone(), attempt.attempt_count, reason, rewrite, delay);
            attempt.advance(MigrationState::PendingArchive);
            attempt.advance(MigrationState::Hot);
            return RecordOutcome::Deferred;
        }
        self.deferred.remove(&record.id);
        attempt.advance(MigrationState::Verified);

        let deleted = self
            .io_retry
            .run("hot.delete", || {
                self.hot.delete_if_unmodified(&record.id, record.updated_at)
            })
            .await;

        match deleted {
            Ok(DeleteOutcome::Deleted) | Ok(DeleteOutcome::Missing) => {
                self.cache.invalidate(&record.id);
                attempt.advance(MigrationState::Deleted);
                RecordOutcome::Archived
            }
            Ok(DeleteOutcome::Modified) => {
                debug!(record_id = %record.id, "modified during migration, leaving hot");
                attempt.advance(MigrationState::Hot);
                RecordOutcome::Skipped
            }
            Err(e) => {
                warn!(record_id = %record.id, error = %e, "hot delete failed, queued for cleanup");
                self.cleanup.push(CleanupEntry {
                    record_id: record.id.clone(),
                    archived_version: record.updated_at,
                    attempts: 1,
                    last_error: e.to_string(),
                });
                RecordOutcome::Archived
            }
        }
    }

    async fn write_and_verify(
        &self,
        record: &Record,
        key: &ColdKey,
        now: Timestamp,
        force_rewrite: bool,
        attempt: &mut MigrationAttempt,
    ) -> Result<()> {
        attempt.advance(MigrationState::Writing);
        let manifest = self.write_artifact(record, key, now, force_rewrite).await?;
        attempt.advance(MigrationState::Verifying);
        self.verify_artifact(key, &manifest.content_hash).await
    }

    async fn write_artifact(
        &self,
        record: &Record,
        key: &ColdKey,
        now: Timestamp,
        force_rewrite: bool,
    ) -> Result<ArchiveManifest> {
        let payload = record.payload_bytes()?;
        let compressed = self.codec.compress(&payload)?;
        let age = record_age(record, now);

        let metadata = ArtifactMetadata {
            manifest: ArchiveManifest {
                record_id: record.id.clone(),
                content_hash: compressed.original_hash.clone(),
                original_size: compressed.original_size as u64,
                compressed_size: compressed.compressed_size() as u64,
                archived_at: now,
                storage_class: self.storage_class.class_for_age(age),
            },
            header: record.header(),
        };

        if !force_rewrite {
            let existing = self.io_retry.run("cold.head", || self.cold.head(key)).await?;
            if let Some(existing) = existing {
                if existing.describes_same_record(&metadata) {
                    debug!(record_id = %record.id, key = %key, "artifact already archived");
                    return Ok(existing.manifest);
                }
            }
        }

        self.io_retry
            .run("cold.put", || {
                self.cold
                    .put(key, compressed.bytes.clone(), metadata.clone())
            })
            .await?;
        Ok(metadata.manifest)
    }

    async fn verify_artifact(&self, key: &ColdKey, expected_hash: &str) -> Result<()> {
        let object = match self.io_retry.run("cold.get", || self.cold.get(key)).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => {
                return Err(Error::transient(
                    "cold.verify",
                    format!("artifact {} missing after write", key),
                ))
            }
            Err(e) => return Err(e),
        };

        let recorded = &object.metadata.manifest.content_hash;
        if recorded != expected_hash {
            return Err(Error::ChecksumMismatch {
                key: key.to_string(),
                expected: expected_hash.to_string(),
                actual: recorded.clone(),
            });
        }

        match self
            .codec
            .decompress_verified(key.as_str(), &object.bytes, expected_hash)
        {
            Ok(_) => Ok(()),
            Err(Error::PermanentValidation(reason)) => Err(Error::ChecksumMismatch {
                key: key.to_string(),
                expected: expected_hash.to_string(),
                actual: format!("undecodable ({})", reason),
            }),
            Err(e) => Err(e),
        }
    }

    fn quarantine_record(&self, mut attempt: MigrationAttempt) -> RecordOutcome {
        attempt.advance(MigrationState::Quarantined);
        let reason = attempt
            .last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        warn!(
            record_id = %attempt.record_id,
            attempts = attempt.attempt_count,
            error = %reason,
            "record quarantined"
        );
        let entry = QuarantineEntry::new(attempt.record_id, attempt.attempt_count, reason);
        self.quarantine.insert(entry.clone());
        RecordOutcome::Quarantined(entry)
    }
}

/// Age of `record` at `now`; a `created_at` in the future counts as zero
fn record_age(record: &Record, now: Timestamp) -> std::time::Duration {
    match (now - record.created_at).to_std() {
        Ok(age) => age,
        Err(_) => {
            debug!(
                record_id = %record.id,
                created_at = %record.created_at,
                "created_at is in the future, classifying by zero age"
            );
            std::time::Duration::ZERO
        }
    }
}
