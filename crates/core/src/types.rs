//! Core record and artifact types
//!
//! This module defines the fundamental types that flow between tiers:
//! - [`RecordId`]: Unique, immutable identifier of a record
//! - [`Record`]: A record as stored in the hot tier
//! - [`ArchiveManifest`]: Integrity and sizing facts about an archived artifact
//! - [`ArtifactMetadata`]: Everything stored next to the artifact bytes in the cold tier

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wall-clock timestamp, always UTC
pub type Timestamp = DateTime<Utc>;

/// Maximum encoded payload size accepted by the hot tier (300 KiB)
pub const DEFAULT_MAX_RECORD_SIZE: usize = 300 * 1024;

/// Unique identifier for a record
///
/// Record ids are opaque strings chosen by the writer (or generated by the
/// record service). They never change once a record exists, which is what
/// lets the cold tier derive artifact keys from them without an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a record id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    /// Generate a fresh random id (UUID v4)
    pub fn generate() -> Self {
        RecordId(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty id, which no tier accepts
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

fn default_status() -> String {
    "active".to_string()
}

/// A record as held by the hot tier
///
/// `created_at` is assigned once at write time and drives archival
/// eligibility. `updated_at` moves on every change. `status` is a business
/// field and plays no part in tiering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique, immutable identifier
    pub id: RecordId,
    /// Opaque structured payload
    pub payload: serde_json::Value,
    /// Creation time, immutable
    pub created_at: Timestamp,
    /// Last modification time
    pub updated_at: Timestamp,
    /// Business status
    #[serde(default = "default_status")]
    pub status: String,
}

impl Record {
    /// Create a record stamped with the current time
    pub fn new(id: impl Into<RecordId>, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Record {
            id: id.into(),
            payload,
            created_at: now,
            updated_at: now,
            status: default_status(),
        }
    }

    /// Override the creation time (and align `updated_at` with it)
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Override the business status
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Canonical encoding of the payload
    ///
    /// Object keys serialize in sorted order, so the same payload always
    /// produces the same bytes and therefore the same content hash.
    pub fn payload_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.payload).map_err(Error::from)
    }

    /// Check the record is admissible to a tier
    ///
    /// Returns `PermanentValidation` for an empty id and `CapacityExceeded`
    /// when the encoded payload is larger than `max_size`.
    pub fn validate(&self, max_size: usize) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::PermanentValidation("record id is empty".to_string()));
        }
        let size = self.payload_bytes()?.len();
        if size > max_size {
            return Err(Error::CapacityExceeded {
                size,
                limit: max_size,
            });
        }
        Ok(())
    }

    /// The envelope fields that accompany an archived payload
    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            created_at: self.created_at,
            updated_at: self.updated_at,
            status: self.status.clone(),
        }
    }

    /// Reassemble a record from an archived payload and its envelope
    pub fn from_parts(id: RecordId, header: RecordHeader, payload: serde_json::Value) -> Self {
        Record {
            id,
            payload,
            created_at: header.created_at,
            updated_at: header.updated_at,
            status: header.status,
        }
    }
}

/// Record fields stored next to an archived payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    /// Creation time of the record
    pub created_at: Timestamp,
    /// Modification time of the archived snapshot
    pub updated_at: Timestamp,
    /// Business status at archival time
    pub status: String,
}

/// Storage class of an archived artifact
///
/// Further transitions inside the cold tier are policy of the cold store,
/// recorded here rather than driven by a second migration pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    /// Regular durable storage
    Standard,
    /// Infrequent access
    Cool,
    /// Long-term archive, slowest to read
    Archive,
}

impl StorageClass {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "standard",
            StorageClass::Cool => "cool",
            StorageClass::Archive => "archive",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integrity and sizing facts about one archived record
///
/// `content_hash` is the hash of the *uncompressed* payload. It is computed
/// once, when the payload is read from the hot tier, and is never derived
/// from compressed bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// Record this artifact holds
    pub record_id: RecordId,
    /// Hex hash of the uncompressed payload
    pub content_hash: String,
    /// Payload size before compression
    pub original_size: u64,
    /// Artifact size after compression
    pub compressed_size: u64,
    /// When the artifact was written
    pub archived_at: Timestamp,
    /// Storage class chosen at archival time
    pub storage_class: StorageClass,
}

impl ArchiveManifest {
    /// Compression ratio (compressed / original), 0.0 for empty payloads
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }
}

/// Metadata stored alongside artifact bytes in the cold tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Integrity manifest
    pub manifest: ArchiveManifest,
    /// Envelope of the archived record
    pub header: RecordHeader,
}

impl ArtifactMetadata {
    /// Whether both describe the same archived record version
    ///
    /// `archived_at` is ignored: replaying an archival of an unchanged
    /// record must match the artifact already stored.
    pub fn describes_same_record(&self, other: &ArtifactMetadata) -> bool {
        let (a, b) = (&self.manifest, &other.manifest);
        a.record_id == b.record_id
            && a.content_hash == b.content_hash
            && a.original_size == b.original_size
            && a.compressed_size == b.compressed_size
            && a.storage_class == b.storage_class
            && self.header == other.header
    }
}
