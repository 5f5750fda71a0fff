//! Retrieval router
//!
//! Resolves a record wherever it currently lives:
//!
//! ```text
//! cache ── hit ──────────────────────────────────────────► Cache
//!   │ miss
//!   ▼  (single flight per id from here on)
//! hot ─── hit ───────────────────────────────────────────► Hot
//!   │ miss
//!   ▼
//! cold ── hit ─► decompress + hash check ─► cache.set ───► Cold
//!   │ miss
//!   ▼
//! NotFound
//! ```
//!
//! Concurrent misses for the same id share one flight, so N simultaneous
//! requests for a cold-only record cost one cold read. Checksum or decode
//! failures on the read path are errors; a damaged artifact is never
//! returned.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use strata_tier_cache::{CachedRecord, RecordCache};
use strata_tier_codec::Codec;
use strata_tier_concurrency::{RetryPolicy, SingleFlight};
use strata_tier_core::{Error, Record, RecordId, Result, Timestamp, TieringConfig};
use strata_tier_storage::{ColdKey, ColdStore, HotStore};
use tracing::debug;

/// Field added to archived records in responses
pub const ARCHIVE_FLAG_FIELD: &str = "retrieved_from_archive";
/// Field carrying the cold retrieval time in responses
pub const RETRIEVAL_TIMESTAMP_FIELD: &str = "retrieval_timestamp";

/// Where a retrieval was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalSource {
    /// Cache hit (always an archived record)
    Cache,
    /// Hot tier
    Hot,
    /// Cold tier, read through to the cache
    Cold,
}

impl RetrievalSource {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalSource::Cache => "cache",
            RetrievalSource::Hot => "hot",
            RetrievalSource::Cold => "cold",
        }
    }
}

impl fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved record and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    /// The record, exactly as stored
    pub record: Record,
    /// Where it was served from
    pub source: RetrievalSource,
    /// When it was read from the cold tier; `None` for hot records
    pub retrieved_at: Option<Timestamp>,
}

impl Retrieval {
    /// Whether the record came out of the archive
    pub fn retrieved_from_archive(&self) -> bool {
        self.retrieved_at.is_some()
    }

    /// Response body: the record plus the additive archive fields
    ///
    /// The archive fields are added only for archived records and only
    /// when the record does not already carry a field of that name.
    pub fn to_json(&self) -> Result<Value> {
        let mut value = serde_json::to_value(&self.record)?;
        if let (Some(retrieved_at), Value::Object(map)) = (self.retrieved_at, &mut value) {
            map.entry(ARCHIVE_FLAG_FIELD).or_insert(Value::Bool(true));
            map.entry(RETRIEVAL_TIMESTAMP_FIELD)
                .or_insert_with(|| Value::String(retrieved_at.to_rfc3339()));
        }
        Ok(value)
    }

    /// The payload with the additive archive fields merged in
    ///
    /// Same rules as [`Retrieval::to_json`]; non-object payloads are
    /// returned unchanged.
    pub fn annotated_payload(&self) -> Value {
        let mut payload = self.record.payload.clone();
        if let (Some(retrieved_at), Value::Object(map)) = (self.retrieved_at, &mut payload) {
            map.entry(ARCHIVE_FLAG_FIELD).or_insert(Value::Bool(true));
            map.entry(RETRIEVAL_TIMESTAMP_FIELD)
                .or_insert_with(|| Value::String(retrieved_at.to_rfc3339()));
        }
        payload
    }
}

/// Reads records across cache, hot tier and cold tier
pub struct RetrievalRouter {
    hot: Arc<dyn HotStore>,
    cold: Arc<dyn ColdStore>,
    cache: Arc<dyn RecordCache>,
    codec: Codec,
    io_retry: RetryPolicy,
    key_prefix: String,
    cache_ttl: Duration,
    max_concurrency: usize,
    flights: SingleFlight<RecordId, Result<Retrieval>>,
}

impl RetrievalRouter {
    /// Router over the given stores
    pub fn new(
        hot: Arc<dyn HotStore>,
        cold: Arc<dyn ColdStore>,
        cache: Arc<dyn RecordCache>,
        config: &TieringConfig,
    ) -> Self {
        RetrievalRouter {
            hot,
            cold,
            cache,
            codec: Codec::new(strata_tier_codec::DEFAULT_LEVEL, config.max_record_size),
            io_retry: RetryPolicy::for_io(config),
            key_prefix: config.cold_key_prefix.clone(),
            cache_ttl: config.cache_ttl(),
            max_concurrency: config.max_concurrency.max(1),
            flights: SingleFlight::new(),
        }
    }

    /// Resolve one record
    pub async fn get(&self, id: &RecordId) -> Result<Retrieval> {
        if let Some(cached) = self.cached(id) {
            return Ok(cached);
        }
        self.flights.run(id.clone(), || self.resolve(id)).await
    }

    /// Resolve several records concurrently, one result per id in request order
    ///
    /// A missing id yields `Err(NotFound)` in its slot; it does not fail
    /// the batch.
    pub async fn get_many(&self, ids: &[RecordId]) -> Vec<Result<Retrieval>> {
        stream::iter(ids)
            .map(|id| self.get(id))
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    /// Cold reads that actually ran (coalesced callers excluded)
    pub fn flights_executed(&self) -> u64 {
        self.flights.executions()
    }

    fn cached(&self, id: &RecordId) -> Option<Retrieval> {
        let cached = self.cache.get(id)?;
        debug!(record_id = %id, "served from cache");
        Some(Retrieval {
            record: cached.record,
            source: RetrievalSource::Cache,
            retrieved_at: Some(cached.retrieved_at),
        })
    }

    async fn resolve(&self, id: &RecordId) -> Result<Retrieval> {
        // A flight that finished between our cache miss and this one
        // starting has already filled the cache.
        if let Some(cached) = self.cached(id) {
            return Ok(cached);
        }

        if let Some(record) = self.io_retry.run("hot.get", || self.hot.get(id)).await? {
            debug!(record_id = %id, "served from hot tier");
            return Ok(Retrieval {
                record,
                source: RetrievalSource::Hot,
                retrieved_at: None,
            });
        }

        let key = ColdKey::for_record(&self.key_prefix, id);
        let object = match self.io_retry.run("cold.get", || self.cold.get(&key)).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => return Err(Error::not_found(format!("record {}", id))),
            Err(e) => return Err(e),
        };

        let manifest = &object.metadata.manifest;
        if manifest.record_id != *id {
            return Err(Error::PermanentValidation(format!(
                "artifact {} belongs to record {}",
                key, manifest.record_id
            )));
        }

        let bytes = self
            .codec
            .decompress_verified(key.as_str(), &object.bytes, &manifest.content_hash)?;
        let payload: Value = serde_json::from_slice(&bytes).map_err(|e| {
            Error::PermanentValidation(format!("artifact {} is not a JSON payload: {}", key, e))
        })?;

        let record = Record::from_parts(id.clone(), object.metadata.header, payload);
        let retrieved_at = Utc::now();
        self.cache.set(
            id.clone(),
            CachedRecord {
                record: record.clone(),
                retrieved_at,
            },
            self.cache_ttl,
        );
        debug!(record_id = %id, key = %key, "served from cold tier");

        Ok(Retrieval {
            record,
            source: RetrievalSource::Cold,
            retrieved_at: Some(retrieved_at),
        })
    }
}
