//! Shared fixtures: fault-injecting store wrappers and record builders.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stratatier::{
    ArtifactMetadata, ColdKey, ColdStore, Error, HotStore, MemoryColdStore, MemoryHotStore, Record,
    RecordId, Result, StopSignal, Timestamp, Tiering, TieringConfig,
};
use strata_tier_storage::{ColdObject, DeleteOutcome, ScanCursor, ScanPage};

pub const DAY_SECS: u64 = 24 * 60 * 60;

// =============================================================================
// Records and configuration
// =============================================================================

/// Record created `days` ago
pub fn aged(id: &str, days: i64, payload: Value) -> Record {
    Record::new(id, payload).with_created_at(Utc::now() - chrono::Duration::days(days))
}

/// Fast retries, 90-day threshold
pub fn test_config() -> TieringConfig {
    TieringConfig {
        archive_threshold_secs: 90 * DAY_SECS,
        ..TieringConfig::for_testing()
    }
}

/// Sleep past the longest retry backoff of `test_config`
pub async fn wait_out_backoff() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}

/// Tiering over the given fault-injecting stores
pub fn tiering(hot: &Arc<FaultyHot>, cold: &Arc<FaultyCold>, config: TieringConfig) -> Tiering {
    Tiering::builder()
        .config(config)
        .hot(hot.clone())
        .cold(cold.clone())
        .build()
        .expect("tiering")
}

// =============================================================================
// Cold store wrapper
// =============================================================================

/// Memory cold store with call counters and injectable faults
#[derive(Default)]
pub struct FaultyCold {
    pub inner: MemoryColdStore,
    gets: AtomicUsize,
    puts: AtomicUsize,
    fail_gets: AtomicUsize,
    corrupt_gets: AtomicUsize,
    get_delay: Mutex<Duration>,
    stop_on_put: Mutex<Option<StopSignal>>,
}

impl FaultyCold {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `get` calls made
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// `put` calls made (including no-op replays)
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Fail the next `n` gets with a transient error
    pub fn fail_next_gets(&self, n: usize) {
        self.fail_gets.store(n, Ordering::SeqCst);
    }

    /// Return damaged bytes from the next `n` gets
    pub fn corrupt_next_gets(&self, n: usize) {
        self.corrupt_gets.store(n, Ordering::SeqCst);
    }

    /// Hold every get for `delay`
    pub fn delay_gets(&self, delay: Duration) {
        *self.get_delay.lock() = delay;
    }

    /// Request `stop` as soon as the first artifact is written
    pub fn stop_on_put(&self, stop: StopSignal) {
        *self.stop_on_put.lock() = Some(stop);
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ColdStore for FaultyCold {
    async fn put(&self, key: &ColdKey, bytes: Vec<u8>, metadata: ArtifactMetadata) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, bytes, metadata).await?;
        if let Some(stop) = self.stop_on_put.lock().as_ref() {
            stop.request_stop();
        }
        Ok(())
    }

    async fn get(&self, key: &ColdKey) -> Result<ColdObject> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let delay = *self.get_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if Self::take(&self.fail_gets) {
            return Err(Error::transient("cold.get", "injected read failure"));
        }

        let mut object = self.inner.get(key).await?;
        if Self::take(&self.corrupt_gets) {
            object.bytes = vec![0xba, 0xd0, 0xba, 0xd0];
        }
        Ok(object)
    }

    async fn head(&self, key: &ColdKey) -> Result<Option<ArtifactMetadata>> {
        self.inner.head(key).await
    }

    async fn delete(&self, key: &ColdKey) -> Result<bool> {
        self.inner.delete(key).await
    }
}

// =============================================================================
// Hot store wrapper
// =============================================================================

/// Memory hot store with injectable delete faults and concurrent writers
#[derive(Default)]
pub struct FaultyHot {
    pub inner: MemoryHotStore,
    fail_deletes: AtomicUsize,
    touch_before_delete: AtomicBool,
}

impl FaultyHot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed records without validation
    pub fn seed(&self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.inner.insert_unchecked(record);
        }
    }

    /// Fail the next `n` deletes with a transient error
    pub fn fail_next_deletes(&self, n: usize) {
        self.fail_deletes.store(n, Ordering::SeqCst);
    }

    /// Simulate a writer updating each record just before the archival delete
    pub fn touch_before_delete(&self) {
        self.touch_before_delete.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl HotStore for FaultyHot {
    async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        self.inner.get(id).await
    }

    async fn put(&self, record: Record) -> Result<()> {
        self.inner.put(record).await
    }

    async fn delete(&self, id: &RecordId) -> Result<bool> {
        if FaultyCold::take(&self.fail_deletes) {
            return Err(Error::transient("hot.delete", "injected delete failure"));
        }
        self.inner.delete(id).await
    }

    async fn delete_if_unmodified(&self, id: &RecordId, expected: Timestamp) -> Result<DeleteOutcome> {
        if FaultyCold::take(&self.fail_deletes) {
            return Err(Error::transient("hot.delete", "injected delete failure"));
        }
        if self.touch_before_delete.swap(false, Ordering::SeqCst) {
            if let Some(mut record) = self.inner.get(id).await? {
                record.updated_at = record.updated_at + chrono::Duration::seconds(1);
                record.status = "touched".into();
                self.inner.insert_unchecked(record);
            }
        }
        self.inner.delete_if_unmodified(id, expected).await
    }

    async fn scan_older_than(
        &self,
        cutoff: Timestamp,
        cursor: Option<&ScanCursor>,
        limit: usize,
    ) -> Result<ScanPage> {
        self.inner.scan_older_than(cutoff, cursor, limit).await
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Record>> {
        self.inner.list(offset, limit).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}
