//! Tiering Integration Test Suite
//!
//! End-to-end behavior of archival passes and retrieval through the
//! `Tiering` facade, with fault-injecting stores from `common`.
//!
//! ```bash
//! cargo test --test tiering
//! cargo test --test tiering archival::
//! ```

mod common;

mod archival;
mod faults;
mod lifecycle;
mod retrieval;
