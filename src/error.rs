//! Error types for the tiered cache

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the tiered cache
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (rejected at construction time)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Level name not present in the configuration
    #[error("Unknown cache level: {0}")]
    UnknownLevel(String),

    /// Value could not be serialized for storage
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Write attempted after the cache was shut down
    #[error("Cache has been shut down")]
    ShutDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration parse error
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Prometheus registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    // =========================================================================
    // Compression Errors
    // =========================================================================
    /// Compression failed
    #[error("Compression with {algorithm} failed: {reason}")]
    CompressionFailed { algorithm: String, reason: String },

    /// Decompression failed
    #[error("Decompression with {algorithm} failed: {reason}")]
    DecompressionFailed { algorithm: String, reason: String },
}
