//! Cache Configuration
//!
//! Level layout and engine switches, injected at construction. Configuration
//! can be built in code or loaded from YAML:
//!
//! ```yaml
//! default_ttl_ms: 300000
//! enable_compression: true
//! levels:
//!   - { name: L1, ttl_ms: 60000, max_size: 10000, priority: 1 }
//!   - { name: L2, max_size: 100000, priority: 2 }   # inherits default_ttl_ms
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::compression::CompressionConfig;
use crate::error::{Error, Result};

/// Default TTL for levels that don't set their own (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Default active expiry sweep interval (60 seconds)
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60 * 1000;

/// Default minimum serialized size before compression is attempted
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1024;

/// Configuration of a single cache level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheLevelConfig {
    /// Unique level name (e.g. "L1")
    pub name: String,
    /// TTL for entries written to this level; 0 inherits `default_ttl_ms`
    #[serde(default)]
    pub ttl_ms: u64,
    /// Maximum number of entries
    pub max_size: usize,
    /// Lower value = checked first
    pub priority: i32,
}

impl CacheLevelConfig {
    /// Create a level configuration
    pub fn new(name: impl Into<String>, ttl_ms: u64, max_size: usize, priority: i32) -> Self {
        Self {
            name: name.into(),
            ttl_ms,
            max_size,
            priority,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Configured levels, in any order
    pub levels: Vec<CacheLevelConfig>,
    /// TTL used by levels that leave `ttl_ms` unset
    pub default_ttl_ms: u64,
    /// Compress large values before storing them
    pub enable_compression: bool,
    /// Minimum serialized size to compress
    pub compression_threshold_bytes: usize,
    /// Register and update Prometheus metrics
    pub enable_metrics: bool,
    /// Interval of the background expiry sweep
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::three_tier()
    }
}

impl CacheConfig {
    /// Configuration with explicit levels and defaults for everything else
    pub fn with_levels(levels: Vec<CacheLevelConfig>) -> Self {
        Self {
            levels,
            default_ttl_ms: DEFAULT_TTL_MS,
            enable_compression: false,
            compression_threshold_bytes: DEFAULT_COMPRESSION_THRESHOLD,
            enable_metrics: false,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }

    /// Conventional hot / warm / cold layout
    pub fn three_tier() -> Self {
        Self::with_levels(vec![
            CacheLevelConfig::new("L1", 60 * 1000, 10_000, 1),
            CacheLevelConfig::new("L2", 5 * 60 * 1000, 100_000, 2),
            CacheLevelConfig::new("L3", 60 * 60 * 1000, 1_000_000, 3),
        ])
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Effective TTL for a level
    pub fn level_ttl_ms(&self, level: &CacheLevelConfig) -> u64 {
        if level.ttl_ms == 0 {
            self.default_ttl_ms
        } else {
            level.ttl_ms
        }
    }

    /// Sweep interval as a Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Compression settings derived from this configuration
    pub fn compression(&self) -> CompressionConfig {
        CompressionConfig {
            enabled: self.enable_compression,
            min_size_bytes: self.compression_threshold_bytes,
            ..CompressionConfig::default()
        }
    }

    /// Reject configurations that would leave a level unusable
    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(Error::Config("at least one cache level is required".into()));
        }

        let mut names = HashSet::new();
        for level in &self.levels {
            if level.name.is_empty() {
                return Err(Error::Config("level name must not be empty".into()));
            }
            if !names.insert(level.name.as_str()) {
                return Err(Error::Config(format!("duplicate level name: {}", level.name)));
            }
            if level.max_size == 0 {
                return Err(Error::Config(format!(
                    "level {} must have max_size > 0",
                    level.name
                )));
            }
            if self.level_ttl_ms(level) == 0 {
                return Err(Error::Config(format!(
                    "level {} has no TTL and default_ttl_ms is 0",
                    level.name
                )));
            }
        }

        if self.sweep_interval_ms == 0 {
            return Err(Error::Config("sweep_interval_ms must be > 0".into()));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_is_three_tier() {
        let config = CacheConfig::default();
        assert_eq!(config.levels.len(), 3);
        assert_eq!(config.levels[0].name, "L1");
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert!(!config.enable_compression);
        config.validate().unwrap();
    }

    #[test]
    fn test_yaml_parsing_with_inherited_ttl() {
        let yaml = r#"
default_ttl_ms: 120000
enable_metrics: true
levels:
  - { name: L1, ttl_ms: 1000, max_size: 10, priority: 1 }
  - { name: L2, max_size: 100, priority: 2 }
"#;
        let config = CacheConfig::from_yaml_str(yaml).unwrap();
        assert!(config.enable_metrics);
        assert_eq!(config.levels.len(), 2);
        assert_eq!(config.level_ttl_ms(&config.levels[0]), 1000);
        assert_eq!(config.level_ttl_ms(&config.levels[1]), 120_000);
        // Unset fields fall back to defaults
        assert_eq!(config.sweep_interval_ms, DEFAULT_SWEEP_INTERVAL_MS);
    }

    #[test]
    fn test_rejects_empty_levels() {
        let config = CacheConfig::with_levels(vec![]);
        assert_matches!(config.validate(), Err(Error::Config(_)));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let config = CacheConfig::with_levels(vec![
            CacheLevelConfig::new("L1", 1000, 10, 1),
            CacheLevelConfig::new("L1", 1000, 10, 2),
        ]);
        assert_matches!(config.validate(), Err(Error::Config(msg)) if msg.contains("duplicate"));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = CacheConfig::with_levels(vec![CacheLevelConfig::new("L1", 1000, 0, 1)]);
        assert_matches!(config.validate(), Err(Error::Config(msg)) if msg.contains("max_size"));
    }

    #[test]
    fn test_rejects_zero_ttl_without_default() {
        let mut config = CacheConfig::with_levels(vec![CacheLevelConfig::new("L1", 0, 10, 1)]);
        config.default_ttl_ms = 0;
        assert_matches!(config.validate(), Err(Error::Config(_)));
    }

    #[test]
    fn test_rejects_zero_sweep_interval() {
        let mut config = CacheConfig::three_tier();
        config.sweep_interval_ms = 0;
        assert_matches!(config.validate(), Err(Error::Config(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        assert_matches!(
            CacheConfig::from_yaml_str("levels: [ {name: L1} ]"),
            Err(Error::Yaml(_))
        );
    }

    #[test]
    fn test_compression_settings() {
        let mut config = CacheConfig::three_tier();
        config.enable_compression = true;
        config.compression_threshold_bytes = 64;

        let compression = config.compression();
        assert!(compression.enabled);
        assert_eq!(compression.min_size_bytes, 64);
    }
}
