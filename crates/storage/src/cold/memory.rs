//! In-memory cold store
//!
//! DashMap keyed by artifact key: lock-free reads, sharded writes. Used in
//! tests and as the reference for backend adapters. Counts physical writes
//! so callers can assert that idempotent replays did not rewrite anything.

use super::{ColdObject, ColdStore};
use crate::credentials::{resolve, Anonymous, CredentialProvider};
use crate::key::ColdKey;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_tier_core::{ArtifactMetadata, Error, Result};

/// Cold store backed by process memory
pub struct MemoryColdStore {
    objects: DashMap<ColdKey, ColdObject>,
    writes: AtomicU64,
    credentials: Arc<dyn CredentialProvider>,
}

impl Default for MemoryColdStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryColdStore {
    /// Empty store
    pub fn new() -> Self {
        MemoryColdStore {
            objects: DashMap::new(),
            writes: AtomicU64::new(0),
            credentials: Arc::new(Anonymous),
        }
    }

    /// Use `provider` for every call
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = provider;
        self
    }

    /// Number of artifacts held
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no artifacts
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Physical writes performed (no-op puts excluded)
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Replace stored bytes without touching metadata (fault injection)
    pub fn corrupt(&self, key: &ColdKey, bytes: Vec<u8>) -> bool {
        match self.objects.get_mut(key) {
            Some(mut object) => {
                object.bytes = bytes;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ColdStore for MemoryColdStore {
    async fn put(&self, key: &ColdKey, bytes: Vec<u8>, metadata: ArtifactMetadata) -> Result<()> {
        resolve(self.credentials.as_ref(), "cold.put")?;
        if let Some(existing) = self.objects.get(key) {
            if existing.same_content(&bytes, &metadata) {
                return Ok(());
            }
        }
        self.objects.insert(key.clone(), ColdObject { bytes, metadata });
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn get(&self, key: &ColdKey) -> Result<ColdObject> {
        resolve(self.credentials.as_ref(), "cold.get")?;
        self.objects
            .get(key)
            .map(|object| object.clone())
            .ok_or_else(|| Error::not_found(key))
    }

    async fn head(&self, key: &ColdKey) -> Result<Option<ArtifactMetadata>> {
        resolve(self.credentials.as_ref(), "cold.head")?;
        Ok(self.objects.get(key).map(|object| object.metadata.clone()))
    }

    async fn delete(&self, key: &ColdKey) -> Result<bool> {
        resolve(self.credentials.as_ref(), "cold.delete")?;
        Ok(self.objects.remove(key).is_some())
    }
}
