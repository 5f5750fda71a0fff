//! Cold store contract
//!
//! The cold tier holds compressed artifacts addressed by [`ColdKey`]. Each
//! artifact carries [`ArtifactMetadata`] (manifest + record envelope).
//!
//! ## Idempotence
//!
//! `put` with the same key, bytes and metadata as the stored artifact is a
//! no-op: no second artifact, no error. Only `archived_at` may differ. `put`
//! with different bytes, hash or record envelope replaces the artifact,
//! which is how a rewrite after a failed verification repairs it.

mod fs;
mod memory;

pub use fs::FsColdStore;
pub use memory::MemoryColdStore;

use crate::key::ColdKey;
use async_trait::async_trait;
use strata_tier_core::{ArtifactMetadata, Result};

/// An artifact read back from the cold tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColdObject {
    /// Compressed payload
    pub bytes: Vec<u8>,
    /// Manifest and record envelope
    pub metadata: ArtifactMetadata,
}

impl ColdObject {
    /// Whether `bytes`/`metadata` describe the same content as this object
    pub(crate) fn same_content(&self, bytes: &[u8], metadata: &ArtifactMetadata) -> bool {
        self.bytes == bytes && self.metadata.describes_same_record(metadata)
    }
}

/// Durable, content-addressed artifact store
#[async_trait]
pub trait ColdStore: Send + Sync {
    /// Store an artifact; repeating an identical put is a no-op
    async fn put(&self, key: &ColdKey, bytes: Vec<u8>, metadata: ArtifactMetadata) -> Result<()>;

    /// Fetch an artifact; `NotFound` if absent
    async fn get(&self, key: &ColdKey) -> Result<ColdObject>;

    /// Fetch only the metadata, if the artifact exists
    async fn head(&self, key: &ColdKey) -> Result<Option<ArtifactMetadata>>;

    /// Whether an artifact exists under `key`
    async fn exists(&self, key: &ColdKey) -> Result<bool> {
        Ok(self.head(key).await?.is_some())
    }

    /// Remove an artifact; returns whether it existed
    async fn delete(&self, key: &ColdKey) -> Result<bool>;
}
