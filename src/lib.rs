//! # Strata Tier
//!
//! Tiered record lifecycle: recent records live in a low-latency hot
//! tier, aged records move to a compressed cold tier, and reads resolve
//! transparently across both.
//!
//! ## Quick Start
//!
//! ```ignore
//! use stratatier::prelude::*;
//!
//! let tiering = Tiering::in_memory()?;
//!
//! // Writes go to the hot tier
//! let record = tiering.records.create(None, json!({"amount": 99.99})).await?;
//!
//! // An external scheduler runs passes; aged records move to the cold tier
//! let report = tiering.run_archival_pass().await?;
//!
//! // Reads resolve wherever the record lives
//! let found = tiering.get(&record.id).await?;
//! println!("{} from {}", found.record.id, found.source);
//! ```
//!
//! ## Guarantees
//!
//! - A hot copy is deleted only after its cold copy has been read back and
//!   its content hash checked, so a record is never missing mid-migration.
//! - Writing the same artifact twice is a no-op; passes are safe to repeat
//!   and to interrupt.
//! - Concurrent reads of the same uncached archived record cost one cold read.
//!
//! ## Crates
//!
//! - [`strata_tier_core`]: records, manifests, errors, configuration
//! - [`strata_tier_codec`]: compression and content hashing
//! - [`strata_tier_storage`]: hot/cold store contracts and adapters
//! - [`strata_tier_cache`]: LRU + TTL cache
//! - [`strata_tier_concurrency`]: retry policy, single flight, stop signal
//! - [`strata_tier_engine`]: orchestrator, router, record service

#![warn(missing_docs)]

mod tiering;

pub mod prelude;

// Re-export main entry points
pub use tiering::{ArchivalHandle, Tiering, TieringBuilder};

// Re-export the building blocks
pub use strata_tier_cache::{CacheStats, CachedRecord, LruTtlCache, RecordCache};
pub use strata_tier_codec::{content_hash, Codec};
pub use strata_tier_concurrency::{RetryPolicy, StopSignal};
pub use strata_tier_core::{
    ArchiveManifest, ArtifactMetadata, Error, Record, RecordHeader, RecordId, Result,
    StorageClass, StorageClassPolicy, Timestamp, TieringConfig,
};
pub use strata_tier_engine::{
    ArchivalOrchestrator, MigrationState, PassOptions, PassReport, QuarantineEntry, RecordService,
    Retrieval, RetrievalRouter, RetrievalSource,
};
pub use strata_tier_storage::{
    ColdKey, ColdStore, CredentialProvider, FsColdStore, HotStore, MemoryColdStore, MemoryHotStore,
    StaticCredentials,
};
