//! Core types for tiered record storage
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`Record`] and [`RecordId`]: the unit of data that moves between tiers
//! - [`ArchiveManifest`] and [`ArtifactMetadata`]: what the cold tier knows about an artifact
//! - [`Error`]: the error taxonomy, with transient/permanent classification
//! - [`TieringConfig`]: the recognized configuration surface

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{StorageClassPolicy, TieringConfig};
pub use error::{Error, Result};
pub use types::{
    ArchiveManifest, ArtifactMetadata, Record, RecordHeader, RecordId, StorageClass, Timestamp,
    DEFAULT_MAX_RECORD_SIZE,
};
