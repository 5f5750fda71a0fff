//! Record service
//!
//! The write side of the request surface. Writes go straight to the hot
//! tier; archived records are immutable, so updating or deleting one that
//! is no longer hot is `NotFound`. Every mutation invalidates the cache
//! entry for the id, otherwise a cached archived snapshot would shadow
//! the hot record (the router consults the cache first).

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use strata_tier_cache::RecordCache;
use strata_tier_concurrency::RetryPolicy;
use strata_tier_core::{Error, Record, RecordId, Result, TieringConfig};
use strata_tier_storage::HotStore;
use tracing::debug;

/// CRUD over the hot tier with cache invalidation
pub struct RecordService {
    hot: Arc<dyn HotStore>,
    cache: Arc<dyn RecordCache>,
    io_retry: RetryPolicy,
    max_record_size: usize,
}

impl RecordService {
    /// Service over the given hot store and cache
    pub fn new(hot: Arc<dyn HotStore>, cache: Arc<dyn RecordCache>, config: &TieringConfig) -> Self {
        RecordService {
            hot,
            cache,
            io_retry: RetryPolicy::for_io(config),
            max_record_size: config.max_record_size,
        }
    }

    /// Store a new record; a fresh UUID is assigned when `id` is `None`
    pub async fn create(&self, id: Option<RecordId>, payload: Value) -> Result<Record> {
        let id = id.unwrap_or_else(RecordId::generate);
        let record = Record::new(id, payload);
        record.validate(self.max_record_size)?;

        if self.io_retry.run("hot.get", || self.hot.get(&record.id)).await?.is_some() {
            return Err(Error::PermanentValidation(format!(
                "record {} already exists",
                record.id
            )));
        }

        self.io_retry
            .run("hot.put", || self.hot.put(record.clone()))
            .await?;
        self.cache.invalidate(&record.id);
        debug!(record_id = %record.id, "record created");
        Ok(record)
    }

    /// Replace the payload (and optionally the status) of a hot record
    pub async fn update(
        &self,
        id: &RecordId,
        payload: Value,
        status: Option<String>,
    ) -> Result<Record> {
        let mut record = self
            .io_retry
            .run("hot.get", || self.hot.get(id))
            .await?
            .ok_or_else(|| Error::not_found(format!("record {}", id)))?;

        record.payload = payload;
        if let Some(status) = status {
            record.status = status;
        }
        // updated_at must move even within one clock tick; archival relies on it
        let now = Utc::now();
        record.updated_at = if now > record.updated_at {
            now
        } else {
            record.updated_at + chrono::Duration::microseconds(1)
        };
        record.validate(self.max_record_size)?;

        self.io_retry
            .run("hot.put", || self.hot.put(record.clone()))
            .await?;
        self.cache.invalidate(id);
        debug!(record_id = %id, "record updated");
        Ok(record)
    }

    /// Remove a hot record
    pub async fn delete(&self, id: &RecordId) -> Result<()> {
        let existed = self.io_retry.run("hot.delete", || self.hot.delete(id)).await?;
        self.cache.invalidate(id);
        if !existed {
            return Err(Error::not_found(format!("record {}", id)));
        }
        debug!(record_id = %id, "record deleted");
        Ok(())
    }

    /// Hot records, newest first
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Record>> {
        self.io_retry
            .run("hot.list", || self.hot.list(offset, limit))
            .await
    }

    /// Number of hot records
    pub async fn count(&self) -> Result<usize> {
        self.io_retry.run("hot.count", || self.hot.count()).await
    }
}
