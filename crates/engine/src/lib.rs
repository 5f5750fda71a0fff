//! Archival and retrieval engine
//!
//! Ties the stores, codec, cache and concurrency utilities together:
//! - [`ArchivalOrchestrator`]: moves aged records from the hot to the cold tier
//! - [`RetrievalRouter`]: serves reads across cache, hot and cold tiers
//! - [`RecordService`]: the write side, with cache invalidation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archival;
pub mod retrieval;
pub mod service;

pub use archival::{
    ArchivalOrchestrator, CleanupEntry, MigrationAttempt, MigrationState, PassOptions, PassReport,
    QuarantineEntry,
};
pub use retrieval::{Retrieval, RetrievalRouter, RetrievalSource};
pub use service::RecordService;
