//! Tiering configuration
//!
//! Sources, lowest to highest precedence:
//! 1. [`TieringConfig::default`]
//! 2. A TOML file ([`TieringConfig::load`])
//! 3. `STRATA_TIER_*` environment variables ([`TieringConfig::with_env_overrides`])
//!
//! Durations are integers in TOML (`*_secs` or `*_ms`) and are exposed as
//! [`Duration`] through accessor methods.
//!
//! ```toml
//! archive_threshold_secs = 7776000
//! batch_size = 100
//! max_concurrency = 8
//! max_retry_attempts = 3
//! retry_backoff_base_ms = 100
//! retry_backoff_max_ms = 10000
//! cache_capacity = 10000
//! cache_ttl_secs = 3600
//!
//! [storage_class]
//! cool_after_secs = 7776000
//! archive_after_secs = 15552000
//! ```

use crate::error::{Error, Result};
use crate::types::{StorageClass, DEFAULT_MAX_RECORD_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DAY_SECS: u64 = 24 * 60 * 60;

/// Maps record age at archival time to a cold-tier storage class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageClassPolicy {
    /// Age from which artifacts go to [`StorageClass::Cool`]
    pub cool_after_secs: u64,
    /// Age from which artifacts go to [`StorageClass::Archive`]
    pub archive_after_secs: u64,
}

impl Default for StorageClassPolicy {
    fn default() -> Self {
        StorageClassPolicy {
            cool_after_secs: 90 * DAY_SECS,
            archive_after_secs: 180 * DAY_SECS,
        }
    }
}

impl StorageClassPolicy {
    /// Storage class for a record of the given age
    pub fn class_for_age(&self, age: Duration) -> StorageClass {
        let secs = age.as_secs();
        if secs >= self.archive_after_secs {
            StorageClass::Archive
        } else if secs >= self.cool_after_secs {
            StorageClass::Cool
        } else {
            StorageClass::Standard
        }
    }
}

/// Configuration for archival and retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieringConfig {
    /// Age after which a record is eligible for archival
    pub archive_threshold_secs: u64,
    /// Records fetched per scan page
    pub batch_size: usize,
    /// Concurrent per-record migrations within a pass
    pub max_concurrency: usize,
    /// Archival attempts per record before quarantine
    pub max_retry_attempts: u32,
    /// Initial backoff between retries
    pub retry_backoff_base_ms: u64,
    /// Backoff ceiling
    pub retry_backoff_max_ms: u64,
    /// Randomize backoff delays
    pub retry_jitter: bool,
    /// Bound on each individual store call
    pub io_timeout_ms: u64,
    /// Attempts per store call before the error is surfaced
    pub io_max_attempts: u32,
    /// Cache capacity in records
    pub cache_capacity: usize,
    /// Cache entry lifetime
    pub cache_ttl_secs: u64,
    /// Largest encoded payload accepted
    pub max_record_size: usize,
    /// Prefix of every cold-tier key
    pub cold_key_prefix: String,
    /// Storage class selection
    pub storage_class: StorageClassPolicy,
}

impl Default for TieringConfig {
    fn default() -> Self {
        TieringConfig {
            archive_threshold_secs: 90 * DAY_SECS,
            batch_size: 100,
            max_concurrency: 8,
            max_retry_attempts: 3,
            retry_backoff_base_ms: 100,
            retry_backoff_max_ms: 10_000,
            retry_jitter: true,
            io_timeout_ms: 5_000,
            io_max_attempts: 3,
            cache_capacity: 10_000,
            cache_ttl_secs: 3_600,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            cold_key_prefix: "records".to_string(),
            storage_class: StorageClassPolicy::default(),
        }
    }
}

impl TieringConfig {
    /// Settings for tests: millisecond backoffs, no jitter, short timeouts
    pub fn for_testing() -> Self {
        TieringConfig {
            retry_backoff_base_ms: 1,
            retry_backoff_max_ms: 5,
            retry_jitter: false,
            io_timeout_ms: 1_000,
            ..Default::default()
        }
    }

    /// Parse from TOML text and validate
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TieringConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Apply `STRATA_TIER_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup, then validate
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(name: &str, raw: String) -> Result<T> {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} has invalid value {:?}", name, raw)))
        }

        if let Some(v) = lookup("STRATA_TIER_ARCHIVE_THRESHOLD_SECS") {
            self.archive_threshold_secs = parse("STRATA_TIER_ARCHIVE_THRESHOLD_SECS", v)?;
        }
        if let Some(v) = lookup("STRATA_TIER_BATCH_SIZE") {
            self.batch_size = parse("STRATA_TIER_BATCH_SIZE", v)?;
        }
        if let Some(v) = lookup("STRATA_TIER_MAX_CONCURRENCY") {
            self.max_concurrency = parse("STRATA_TIER_MAX_CONCURRENCY", v)?;
        }
        if let Some(v) = lookup("STRATA_TIER_MAX_RETRY_ATTEMPTS") {
            self.max_retry_attempts = parse("STRATA_TIER_MAX_RETRY_ATTEMPTS", v)?;
        }
        if let Some(v) = lookup("STRATA_TIER_CACHE_CAPACITY") {
            self.cache_capacity = parse("STRATA_TIER_CACHE_CAPACITY", v)?;
        }
        if let Some(v) = lookup("STRATA_TIER_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse("STRATA_TIER_CACHE_TTL_SECS", v)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if self.max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be at least 1".into()));
        }
        if self.max_retry_attempts == 0 {
            return Err(Error::Config("max_retry_attempts must be at least 1".into()));
        }
        if self.io_max_attempts == 0 {
            return Err(Error::Config("io_max_attempts must be at least 1".into()));
        }
        if self.cache_capacity == 0 {
            return Err(Error::Config("cache_capacity must be at least 1".into()));
        }
        if self.retry_backoff_base_ms > self.retry_backoff_max_ms {
            return Err(Error::Config(format!(
                "retry_backoff_base_ms ({}) exceeds retry_backoff_max_ms ({})",
                self.retry_backoff_base_ms, self.retry_backoff_max_ms
            )));
        }
        if self.storage_class.archive_after_secs < self.storage_class.cool_after_secs {
            return Err(Error::Config(
                "storage_class.archive_after_secs must not precede cool_after_secs".into(),
            ));
        }
        if self.cold_key_prefix.is_empty() || self.cold_key_prefix.contains("..") {
            return Err(Error::Config(format!(
                "invalid cold_key_prefix {:?}",
                self.cold_key_prefix
            )));
        }
        Ok(())
    }

    /// Age after which a record is eligible for archival
    pub fn archive_threshold(&self) -> Duration {
        Duration::from_secs(self.archive_threshold_secs)
    }

    /// Initial retry backoff
    pub fn retry_backoff_base(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_base_ms)
    }

    /// Retry backoff ceiling
    pub fn retry_backoff_max(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_max_ms)
    }

    /// Bound on each store call
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Cache entry lifetime
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = TieringConfig::default();
        config.validate().unwrap();
        assert_eq!(config.archive_threshold(), Duration::from_secs(90 * DAY_SECS));
        assert_eq!(config.max_record_size, 300 * 1024);
        TieringConfig::for_testing().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TieringConfig::from_toml_str(
            r#"
            batch_size = 25
            cache_ttl_secs = 60

            [storage_class]
            archive_after_secs = 31536000
            "#,
        )
        .unwrap();

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.storage_class.archive_after_secs, 31_536_000);
        assert_eq!(config.storage_class.cool_after_secs, 90 * DAY_SECS);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TieringConfig::from_toml_str("batch_size = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = TieringConfig::from_toml_str("batch_size = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_backoff_bounds_validated() {
        let config = TieringConfig {
            retry_backoff_base_ms: 500,
            retry_backoff_max_ms: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            ("STRATA_TIER_BATCH_SIZE", "10"),
            ("STRATA_TIER_MAX_CONCURRENCY", " 2 "),
        ]
        .into_iter()
        .collect();

        let config = TieringConfig::default()
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.max_retry_attempts, 3);
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let err = TieringConfig::default()
            .with_overrides(|name| (name == "STRATA_TIER_CACHE_CAPACITY").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("STRATA_TIER_CACHE_CAPACITY"));
    }

    #[test]
    fn test_load_from_file_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tier.toml");
        std::fs::write(&path, "max_retry_attempts = 5\n").unwrap();

        let config = TieringConfig::load(&path).unwrap();
        assert_eq!(config.max_retry_attempts, 5);

        let rendered = config.to_toml_string().unwrap();
        assert_eq!(TieringConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn test_storage_class_policy() {
        let policy = StorageClassPolicy::default();
        assert_eq!(
            policy.class_for_age(Duration::from_secs(10 * DAY_SECS)),
            StorageClass::Standard
        );
        assert_eq!(
            policy.class_for_age(Duration::from_secs(120 * DAY_SECS)),
            StorageClass::Cool
        );
        assert_eq!(
            policy.class_for_age(Duration::from_secs(400 * DAY_SECS)),
            StorageClass::Archive
        );
    }
}
