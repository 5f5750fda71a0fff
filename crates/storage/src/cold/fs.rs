//! Filesystem cold store
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<key>             compressed artifact
//! <root>/<key>.meta.json   ArtifactMetadata sidecar
//! ```
//!
//! Both files are written to a temporary name and renamed into place,
//! artifact first, sidecar last. The sidecar is what makes an artifact
//! visible (`head`/`get`), so a crash part-way through a put leaves either
//! the previous artifact or nothing, never a torn one.

use super::{ColdObject, ColdStore};
use crate::credentials::{resolve, Anonymous, CredentialProvider};
use crate::key::ColdKey;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_tier_core::{ArtifactMetadata, Error, Result};
use tracing::debug;

const META_SUFFIX: &str = ".meta.json";

/// Cold store backed by a local directory
pub struct FsColdStore {
    root: PathBuf,
    tmp_seq: AtomicU64,
    credentials: Arc<dyn CredentialProvider>,
}

impl FsColdStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(FsColdStore {
            root,
            tmp_seq: AtomicU64::new(0),
            credentials: Arc::new(Anonymous),
        })
    }

    /// Use `provider` for every call
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = provider;
        self
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, key: &ColdKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn meta_path(&self, key: &ColdKey) -> PathBuf {
        self.root.join(format!("{}{}", key.as_str(), META_SUFFIX))
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Internal(format!("no file name in {}", path.display())))?;
        let tmp = path.with_file_name(format!(".{}.tmp.{}.{}", file_name, std::process::id(), seq));

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_meta(&self, key: &ColdKey) -> Result<Option<ArtifactMetadata>> {
        match tokio::fs::read(self.meta_path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(|e| {
                Error::PermanentValidation(format!("corrupt metadata for {}: {}", key, e))
            })?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ColdStore for FsColdStore {
    async fn put(&self, key: &ColdKey, bytes: Vec<u8>, metadata: ArtifactMetadata) -> Result<()> {
        resolve(self.credentials.as_ref(), "cold.put")?;

        if let Some(existing) = self.read_meta(key).await? {
            if existing.describes_same_record(&metadata) {
                if let Ok(stored) = tokio::fs::read(self.data_path(key)).await {
                    if stored == bytes {
                        debug!(key = %key, "identical artifact already stored");
                        return Ok(());
                    }
                }
            }
        }

        let data_path = self.data_path(key);
        if let Some(parent) = data_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let meta = serde_json::to_vec_pretty(&metadata)?;

        self.write_atomic(&data_path, &bytes).await?;
        self.write_atomic(&self.meta_path(key), &meta).await?;
        debug!(key = %key, bytes = bytes.len(), "artifact written");
        Ok(())
    }

    async fn get(&self, key: &ColdKey) -> Result<ColdObject> {
        resolve(self.credentials.as_ref(), "cold.get")?;
        let metadata = self
            .read_meta(key)
            .await?
            .ok_or_else(|| Error::not_found(key))?;
        let bytes = match tokio::fs::read(self.data_path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::PermanentValidation(format!(
                    "artifact {} has metadata but no data",
                    key
                )))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(ColdObject { bytes, metadata })
    }

    async fn head(&self, key: &ColdKey) -> Result<Option<ArtifactMetadata>> {
        resolve(self.credentials.as_ref(), "cold.head")?;
        self.read_meta(key).await
    }

    async fn delete(&self, key: &ColdKey) -> Result<bool> {
        resolve(self.credentials.as_ref(), "cold.delete")?;
        let existed = match tokio::fs::remove_file(self.meta_path(key)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match tokio::fs::remove_file(self.data_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(existed),
            Err(e) => Err(e.into()),
        }
    }
}
