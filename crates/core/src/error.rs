//! Error taxonomy for tiered storage
//!
//! Every crate in the workspace returns [`Error`]. Variants fall into three
//! groups that drive retry decisions:
//!
//! | Group | Variants | Handling |
//! |-------|----------|----------|
//! | Transient | `TransientStore`, `Timeout`, `Io` | retried with backoff |
//! | Retryable integrity | `ChecksumMismatch` | retried by archival up to the ceiling, then quarantined |
//! | Permanent | `PermanentValidation`, `CapacityExceeded`, `Config`, `Serialization` | never retried |
//!
//! `NotFound` is an answer, not a failure. `Error` is `Clone` so one
//! resolved result can be handed to every waiter of a coalesced read.

use thiserror::Error;

/// All tiering errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Store unavailable, throttled, or failed in a way that may clear up
    #[error("transient store error during {operation}: {message}")]
    TransientStore {
        /// Operation that failed (e.g. "cold.put")
        operation: String,
        /// Backend message
        message: String,
    },

    /// A store call exceeded its time bound
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Bound that was exceeded
        after_ms: u64,
    },

    /// Recomputed hash differs from the manifest
    #[error("checksum mismatch for {key}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Artifact key
        key: String,
        /// Hash recorded in the manifest
        expected: String,
        /// Hash recomputed from the artifact
        actual: String,
    },

    /// Malformed record or corrupt artifact
    #[error("validation failed: {0}")]
    PermanentValidation(String),

    /// Entity not found in any tier
    #[error("not found: {0}")]
    NotFound(String),

    /// Payload larger than the configured limit
    #[error("record size {size} exceeds limit {limit}")]
    CapacityExceeded {
        /// Encoded payload size
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// An archival pass for this dataset is already running
    #[error("an archival pass is already in progress")]
    PassInProgress,

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for tiering operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a transient store error
    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::TransientStore {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a not-found error
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Error::NotFound(what.to_string())
    }

    /// Check if this error may clear up on its own.
    ///
    /// Transient errors are retried by the shared retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::TransientStore { .. } | Error::Timeout { .. } | Error::Io(_)
        )
    }

    /// Check if the archival state machine may retry after this error.
    ///
    /// Adds checksum mismatches to the transient set: a rewrite may fix them.
    pub fn is_retryable(&self) -> bool {
        self.is_transient() || matches!(self, Error::ChecksumMismatch { .. })
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if retrying can never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Error::PermanentValidation(_)
                | Error::CapacityExceeded { .. }
                | Error::Config(_)
                | Error::Serialization(_)
        )
    }

    /// Stable short code for reports and logs
    pub fn code(&self) -> &'static str {
        match self {
            Error::TransientStore { .. } => "TransientStore",
            Error::Timeout { .. } => "Timeout",
            Error::ChecksumMismatch { .. } => "ChecksumMismatch",
            Error::PermanentValidation(_) => "PermanentValidation",
            Error::NotFound(_) => "NotFound",
            Error::CapacityExceeded { .. } => "CapacityExceeded",
            Error::PassInProgress => "PassInProgress",
            Error::Config(_) => "Config",
            Error::Serialization(_) => "Serialization",
            Error::Io(_) => "Io",
            Error::Internal(_) => "Internal",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(e.to_string()),
            std::io::ErrorKind::InvalidData => Error::PermanentValidation(e.to_string()),
            _ => Error::Io(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
