//! Record codec
//!
//! Reversible compression with integrity hashing for archived payloads.
//!
//! ## Format
//!
//! An artifact is a single zstd frame with the content checksum flag set,
//! so truncation or bit rot is caught by the decoder itself. Independently of
//! the frame checksum, [`Codec::compress`] returns the xxh3-128 hash of the
//! *uncompressed* input; that hash goes into the archive manifest and is
//! what verification compares against after decompression.
//!
//! ## Usage
//!
//! ```ignore
//! let codec = Codec::default();
//! let compressed = codec.compress(b"{\"amount\":99.99}")?;
//! let original = codec.decompress(&compressed.bytes)?;
//! assert_eq!(content_hash(&original), compressed.original_hash);
//! ```

#![warn(missing_docs)]

use std::io::{Read, Write};
use strata_tier_core::{Error, Result, DEFAULT_MAX_RECORD_SIZE};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_128;

/// Default zstd level, matching the archive bundles
pub const DEFAULT_LEVEL: i32 = 3;

/// Hex-encoded xxh3-128 hash of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:032x}", xxh3_128(bytes))
}

/// Output of [`Codec::compress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    /// Compressed artifact bytes
    pub bytes: Vec<u8>,
    /// Hash of the uncompressed input
    pub original_hash: String,
    /// Size of the uncompressed input
    pub original_size: usize,
}

impl Compressed {
    /// Size of the compressed artifact
    pub fn compressed_size(&self) -> usize {
        self.bytes.len()
    }
}

/// zstd codec with bounded decompression
#[derive(Debug, Clone)]
pub struct Codec {
    level: i32,
    max_decoded_size: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Codec::new(DEFAULT_LEVEL, DEFAULT_MAX_RECORD_SIZE)
    }
}

impl Codec {
    /// Create a codec
    ///
    /// `max_decoded_size` bounds decompression output; anything larger is
    /// treated as a corrupt artifact rather than allocated.
    pub fn new(level: i32, max_decoded_size: usize) -> Self {
        Codec {
            level,
            max_decoded_size,
        }
    }

    /// Compression level in use
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Compress `bytes` and hash the original
    pub fn compress(&self, bytes: &[u8]) -> Result<Compressed> {
        let original_hash = content_hash(bytes);

        let mut encoder = zstd::stream::Encoder::new(Vec::with_capacity(bytes.len() / 2), self.level)
            .map_err(|e| Error::Internal(format!("zstd encoder: {}", e)))?;
        encoder
            .include_checksum(true)
            .map_err(|e| Error::Internal(format!("zstd checksum flag: {}", e)))?;
        encoder
            .write_all(bytes)
            .map_err(|e| Error::Internal(format!("zstd encode: {}", e)))?;
        let compressed = encoder
            .finish()
            .map_err(|e| Error::Internal(format!("zstd finish: {}", e)))?;

        debug!(
            original = bytes.len(),
            compressed = compressed.len(),
            "compressed payload"
        );

        Ok(Compressed {
            bytes: compressed,
            original_hash,
            original_size: bytes.len(),
        })
    }

    /// Decompress an artifact
    ///
    /// Any decoder failure, including a frame checksum failure or output
    /// larger than the configured bound, is a `PermanentValidation` error.
    pub fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let decoder = zstd::stream::Decoder::new(bytes)
            .map_err(|e| Error::PermanentValidation(format!("zstd decode: {}", e)))?;

        let limit = self.max_decoded_size as u64 + 1;
        let mut out = Vec::new();
        decoder
            .take(limit)
            .read_to_end(&mut out)
            .map_err(|e| Error::PermanentValidation(format!("corrupted artifact: {}", e)))?;

        if out.len() > self.max_decoded_size {
            return Err(Error::PermanentValidation(format!(
                "decoded artifact exceeds {} bytes",
                self.max_decoded_size
            )));
        }
        Ok(out)
    }

    /// Decompress and check the result against `expected_hash`
    pub fn decompress_verified(&self, key: &str, bytes: &[u8], expected_hash: &str) -> Result<Vec<u8>> {
        let out = self.decompress(bytes)?;
        let actual = content_hash(&out);
        if actual != expected_hash {
            return Err(Error::ChecksumMismatch {
                key: key.to_string(),
                expected: expected_hash.to_string(),
                actual,
            });
        }
        Ok(out)
    }
}
