//! Cold-tier key derivation
//!
//! Keys are a pure function of the record id, so the orchestrator and the
//! router locate the same artifact without any index:
//!
//! ```text
//! <prefix>/<shard>/<escaped id>.json.zst
//! records/3f/r1.json.zst
//! ```
//!
//! `shard` is the low byte of the id's xxh3 hash and spreads artifacts
//! across prefixes. The id is escaped so the key is a safe relative path:
//! ASCII letters, digits, `-` and `_` pass through, every other byte becomes
//! `%XX`.

use std::fmt;
use strata_tier_core::RecordId;
use xxhash_rust::xxh3::xxh3_64;

/// Suffix of every artifact key
pub const ARTIFACT_SUFFIX: &str = ".json.zst";

/// Deterministic key of an archived record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColdKey(String);

impl ColdKey {
    /// Derive the key of `id` under `prefix`
    pub fn for_record(prefix: &str, id: &RecordId) -> Self {
        let shard = xxh3_64(id.as_str().as_bytes()) & 0xff;
        ColdKey(format!(
            "{}/{:02x}/{}{}",
            prefix.trim_end_matches('/'),
            shard,
            escape(id.as_str()),
            ARTIFACT_SUFFIX
        ))
    }

    /// Borrow the key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
