//! In-memory hot store
//!
//! Two structures under one lock:
//! - FxHashMap by id for O(1) point reads
//! - BTreeSet of `(created_at, id)` for ordered age scans
//!
//! The store can be snapshotted to and restored from a JSON-lines file,
//! one record per line, which is how the CLI keeps state between runs.

use super::{DeleteOutcome, HotStore, ScanCursor, ScanPage};
use crate::credentials::{resolve, Anonymous, CredentialProvider};
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use strata_tier_core::{Error, Record, RecordId, Result, Timestamp, DEFAULT_MAX_RECORD_SIZE};
use tracing::debug;

#[derive(Debug, Default)]
struct HotInner {
    records: FxHashMap<RecordId, Record>,
    by_age: BTreeSet<(Timestamp, RecordId)>,
}

impl HotInner {
    fn insert(&mut self, mut record: Record) {
        if let Some(existing) = self.records.get(&record.id) {
            record.created_at = existing.created_at;
        } else {
            self.by_age.insert((record.created_at, record.id.clone()));
        }
        self.records.insert(record.id.clone(), record);
    }

    fn remove(&mut self, id: &RecordId) -> bool {
        match self.records.remove(id) {
            Some(record) => {
                self.by_age.remove(&(record.created_at, record.id));
                true
            }
            None => false,
        }
    }
}

/// Hot store backed by process memory
pub struct MemoryHotStore {
    inner: RwLock<HotInner>,
    max_record_size: usize,
    credentials: Arc<dyn CredentialProvider>,
}

impl Default for MemoryHotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHotStore {
    /// Empty store with the default record size limit
    pub fn new() -> Self {
        Self::with_max_record_size(DEFAULT_MAX_RECORD_SIZE)
    }

    /// Empty store rejecting payloads above `max_record_size`
    pub fn with_max_record_size(max_record_size: usize) -> Self {
        MemoryHotStore {
            inner: RwLock::new(HotInner::default()),
            max_record_size,
            credentials: Arc::new(Anonymous),
        }
    }

    /// Use `provider` for every call
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = provider;
        self
    }

    /// Insert without validation or credentials (test fixtures, snapshots)
    pub fn insert_unchecked(&self, record: Record) {
        self.inner.write().insert(record);
    }

    /// Restore a store from a JSON-lines snapshot; a missing file is an empty store
    pub fn load_jsonl(path: impl AsRef<Path>, max_record_size: usize) -> Result<Self> {
        let store = Self::with_max_record_size(max_record_size);
        let path = path.as_ref();
        if !path.exists() {
            return Ok(store);
        }

        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut inner = store.inner.write();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(&line).map_err(|e| {
                Error::Serialization(format!("{}:{}: {}", path.display(), line_no + 1, e))
            })?;
            inner.insert(record);
        }
        debug!(path = %path.display(), records = inner.records.len(), "loaded hot snapshot");
        drop(inner);
        Ok(store)
    }

    /// Write a JSON-lines snapshot (temp file + rename)
    pub fn save_jsonl(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("jsonl.tmp");
        {
            let inner = self.inner.read();
            let mut writer = BufWriter::new(std::fs::File::create(&tmp)?);
            for (_, id) in &inner.by_age {
                if let Some(record) = inner.records.get(id) {
                    serde_json::to_writer(&mut writer, record)?;
                    writer.write_all(b"\n")?;
                }
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[async_trait]
impl HotStore for MemoryHotStore {
    async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        resolve(self.credentials.as_ref(), "hot.get")?;
        Ok(self.inner.read().records.get(id).cloned())
    }

    async fn put(&self, record: Record) -> Result<()> {
        resolve(self.credentials.as_ref(), "hot.put")?;
        record.validate(self.max_record_size)?;
        self.inner.write().insert(record);
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<bool> {
        resolve(self.credentials.as_ref(), "hot.delete")?;
        Ok(self.inner.write().remove(id))
    }

    async fn delete_if_unmodified(
        &self,
        id: &RecordId,
        expected: Timestamp,
    ) -> Result<DeleteOutcome> {
        resolve(self.credentials.as_ref(), "hot.delete")?;
        let mut inner = self.inner.write();
        let outcome = match inner.records.get(id) {
            None => DeleteOutcome::Missing,
            Some(current) if current.updated_at != expected => DeleteOutcome::Modified,
            Some(_) => {
                inner.remove(id);
                DeleteOutcome::Deleted
            }
        };
        Ok(outcome)
    }

    async fn scan_older_than(
        &self,
        cutoff: Timestamp,
        cursor: Option<&ScanCursor>,
        limit: usize,
    ) -> Result<ScanPage> {
        resolve(self.credentials.as_ref(), "hot.scan")?;
        let inner = self.inner.read();

        let lower = match cursor {
            Some(c) => Bound::Excluded((c.created_at, c.id.clone())),
            None => Bound::Unbounded,
        };

        let mut records = Vec::with_capacity(limit.min(1024));
        let mut more = false;
        for (created_at, id) in inner.by_age.range((lower, Bound::Unbounded)) {
            if *created_at >= cutoff {
                break;
            }
            if records.len() == limit {
                more = true;
                break;
            }
            if let Some(record) = inner.records.get(id) {
                records.push(record.clone());
            }
        }

        let next_cursor = if more {
            records.last().map(ScanCursor::after)
        } else {
            None
        };
        Ok(ScanPage {
            records,
            next_cursor,
        })
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Record>> {
        resolve(self.credentials.as_ref(), "hot.list")?;
        let inner = self.inner.read();
        Ok(inner
            .by_age
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .filter_map(|(_, id)| inner.records.get(id).cloned())
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().records.len())
    }
}
