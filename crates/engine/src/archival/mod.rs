//! Hot-to-cold archival
//!
//! - [`ArchivalOrchestrator`]: runs passes and owns the per-pass bookkeeping
//! - [`MigrationState`] / [`MigrationAttempt`]: the per-record state machine
//! - [`DeferredRegistry`]: records backing off after a failed attempt
//! - [`QuarantineRegistry`]: records excluded from archival until cleared
//! - [`CleanupQueue`]: verified records whose hot delete is outstanding
//! - [`PassOptions`] / [`PassReport`]: pass parameters and results

mod cleanup;
mod deferred;
mod orchestrator;
mod quarantine;
mod report;
mod state;

pub use cleanup::{CleanupEntry, CleanupQueue};
pub use deferred::{DeferredEntry, DeferredRegistry};
pub use orchestrator::ArchivalOrchestrator;
pub use quarantine::{QuarantineEntry, QuarantineRegistry};
pub use report::{PassOptions, PassReport};
pub use state::{MigrationAttempt, MigrationState};
