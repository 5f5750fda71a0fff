//! Concurrency utilities for tiered archival
//!
//! This crate holds the pieces shared by the archival orchestrator and the
//! retrieval router:
//! - [`RetryPolicy`]: bounded timeout + exponential backoff with jitter
//! - [`SingleFlight`]: coalesces concurrent calls for the same key
//! - [`StopSignal`]: cooperative stop for an in-flight pass

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod retry;
pub mod signal;
pub mod single_flight;

pub use retry::RetryPolicy;
pub use signal::StopSignal;
pub use single_flight::SingleFlight;
