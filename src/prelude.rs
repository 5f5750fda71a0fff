//! Convenient imports for Strata Tier.
//!
//! ```ignore
//! use stratatier::prelude::*;
//!
//! let tiering = Tiering::in_memory()?;
//! let found = tiering.get(&RecordId::new("r1")).await?;
//! ```

// Main entry point
pub use crate::tiering::{Tiering, TieringBuilder};

// Error handling
pub use strata_tier_core::{Error, Result};

// Core types
pub use strata_tier_core::{Record, RecordId, Timestamp, TieringConfig};

// Archival and retrieval
pub use strata_tier_engine::{PassOptions, PassReport, Retrieval, RetrievalSource};
pub use strata_tier_concurrency::StopSignal;

// Store contracts
pub use strata_tier_storage::{ColdStore, HotStore};

// Re-export serde_json for convenience
pub use serde_json::json;
