//! Storage adapters for tiered archival
//!
//! This crate defines the two store contracts the engine depends on, plus
//! reference implementations:
//! - [`HotStore`]: low-latency CRUD with a cursor-paginated age scan
//!   ([`MemoryHotStore`])
//! - [`ColdStore`]: content-addressed durable artifacts
//!   ([`MemoryColdStore`], [`FsColdStore`])
//! - [`ColdKey`]: deterministic artifact key derived from a record id
//! - [`CredentialProvider`]: opaque credentials resolved before every call

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cold;
pub mod credentials;
pub mod hot;
pub mod key;

pub use cold::{ColdObject, ColdStore, FsColdStore, MemoryColdStore};
pub use credentials::{Anonymous, Credential, CredentialProvider, StaticCredentials};
pub use hot::{DeleteOutcome, HotStore, MemoryHotStore, ScanCursor, ScanPage};
pub use key::ColdKey;
