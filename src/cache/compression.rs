//! Cache Compression Support
//!
//! Pluggable compression applied to serialized values before they are stored.
//! Disabled by default; when enabled only payloads at or above the configured
//! threshold are compressed, and the compressed form is kept only when it is
//! actually smaller.
//!
//! # Example
//!
//! ```
//! use tiercache::cache::compression::{CompressionConfig, CompressionManager};
//!
//! let manager = CompressionManager::new(CompressionConfig::enabled(16));
//!
//! let data = b"Hello, this is test data. Hello, this is test data. Hello again!";
//! let encoded = manager.compress(data);
//!
//! let decoded = manager.decompress(&encoded).unwrap();
//! assert_eq!(decoded.as_ref(), data);
//! ```

use std::sync::Arc;

use bytes::Bytes;

use super::entry::EncodedValue;
use crate::error::{Error, Result};

// =============================================================================
// Compression Algorithm
// =============================================================================

/// Algorithm recorded alongside each stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionAlgorithm {
    /// Stored as-is
    #[default]
    None,
    /// LZ4 block compression
    Lz4,
    /// Caller-supplied strategy, identified by name
    Custom(&'static str),
}

impl CompressionAlgorithm {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            CompressionAlgorithm::None => "none",
            CompressionAlgorithm::Lz4 => "lz4",
            CompressionAlgorithm::Custom(name) => *name,
        }
    }
}

impl std::fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Compression Configuration
// =============================================================================

/// Configuration for compression
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Whether values are compressed at all
    pub enabled: bool,
    /// Minimum serialized size to compress (smaller values are stored as-is)
    pub min_size_bytes: usize,
    /// LZ4 compression level
    pub level: i32,
}

impl CompressionConfig {
    /// Compression switched on with the given threshold
    pub fn enabled(min_size_bytes: usize) -> Self {
        Self {
            enabled: true,
            min_size_bytes,
            ..Self::default()
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_size_bytes: 1024,
            level: 4,
        }
    }
}

// =============================================================================
// Compressor Trait
// =============================================================================

/// Trait for compression implementations
pub trait Compressor: Send + Sync {
    /// Get the algorithm identifier
    fn algorithm(&self) -> CompressionAlgorithm;

    /// Compress data
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress data
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

// =============================================================================
// No-Op Compressor
// =============================================================================

/// Pass-through compressor (no compression)
pub struct NoopCompressor;

impl Compressor for NoopCompressor {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::None
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

// =============================================================================
// LZ4 Compressor
// =============================================================================

/// LZ4 compressor (fast compression)
pub struct Lz4Compressor {
    level: i32,
}

impl Lz4Compressor {
    /// Create new LZ4 compressor with default settings
    pub fn new() -> Self {
        Self { level: 4 }
    }

    /// Create with custom compression level
    pub fn with_level(level: i32) -> Self {
        Self { level }
    }
}

impl Default for Lz4Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for Lz4Compressor {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::Lz4
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4::block::compress(
            data,
            Some(lz4::block::CompressionMode::HIGHCOMPRESSION(self.level)),
            true,
        )
        .map_err(|e| Error::CompressionFailed {
            algorithm: "LZ4".into(),
            reason: e.to_string(),
        })
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4::block::decompress(data, None).map_err(|e| Error::DecompressionFailed {
            algorithm: "LZ4".into(),
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// Compression Manager
// =============================================================================

/// Applies the configured compressor to values on the way in and reverses it
/// on the way out.
pub struct CompressionManager {
    config: CompressionConfig,
    compressor: Arc<dyn Compressor>,
}

impl CompressionManager {
    /// Create a manager using LZ4 when compression is enabled
    pub fn new(config: CompressionConfig) -> Self {
        let compressor: Arc<dyn Compressor> = if config.enabled {
            Arc::new(Lz4Compressor::with_level(config.level))
        } else {
            Arc::new(NoopCompressor)
        };
        Self { config, compressor }
    }

    /// Create a manager around a caller-supplied compressor
    pub fn with_compressor(config: CompressionConfig, compressor: Arc<dyn Compressor>) -> Self {
        Self { config, compressor }
    }

    /// Pass-through manager
    pub fn disabled() -> Self {
        Self::new(CompressionConfig::default())
    }

    /// Encode serialized bytes for storage.
    ///
    /// Falls back to the uncompressed form if compression is disabled, the
    /// payload is under the threshold, compression fails, or it doesn't help.
    pub fn compress(&self, data: &[u8]) -> EncodedValue {
        let algorithm = self.compressor.algorithm();
        if !self.config.enabled
            || algorithm == CompressionAlgorithm::None
            || data.len() < self.config.min_size_bytes
        {
            return EncodedValue::plain(Bytes::copy_from_slice(data));
        }

        match self.compressor.compress(data) {
            Ok(compressed) if compressed.len() < data.len() => EncodedValue {
                data: Bytes::from(compressed),
                algorithm,
            },
            Ok(_) => EncodedValue::plain(Bytes::copy_from_slice(data)),
            Err(e) => {
                tracing::warn!("Compression with {} failed, storing uncompressed: {}", algorithm, e);
                EncodedValue::plain(Bytes::copy_from_slice(data))
            }
        }
    }

    /// Decode a stored value back into serialized bytes
    pub fn decompress(&self, value: &EncodedValue) -> Result<Bytes> {
        if value.algorithm == CompressionAlgorithm::None {
            return Ok(value.data.clone());
        }

        if value.algorithm != self.compressor.algorithm() {
            return Err(Error::DecompressionFailed {
                algorithm: value.algorithm.to_string(),
                reason: format!("active compressor is {}", self.compressor.algorithm()),
            });
        }

        let decompressed = self.compressor.decompress(&value.data)?;
        Ok(Bytes::from(decompressed))
    }

    /// Get configuration
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }
}

impl Default for CompressionManager {
    fn default() -> Self {
        Self::disabled()
    }
}
