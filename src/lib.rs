//! tiercache - Multi-Level In-Process Cache
//!
//! A tiered key-value cache: an ordered set of named levels, each with its own
//! TTL and capacity, consulted fastest first. Hits in slower levels are
//! promoted, full levels evict their least recently used entry, and misses can
//! be filled by a caller-supplied fetcher with concurrent misses coalesced into
//! one fetch.
//!
//! # Modules
//!
//! - [`cache`] - Levels, policies, the cache manager and its statistics
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use tiercache::{CacheConfig, CacheLevelConfig, MultiLevelCache};
//!
//! let config = CacheConfig::with_levels(vec![
//!     CacheLevelConfig::new("L1", 60_000, 1_000, 1),
//!     CacheLevelConfig::new("L2", 300_000, 10_000, 2),
//! ]);
//! let cache = MultiLevelCache::new(config)?;
//!
//! cache.set_in_level("L2", "user:42", &"zoe", None)?;
//! assert_eq!(cache.get::<String>("user:42").as_deref(), Some("zoe"));
//! assert!(cache.contains_in_level("L1", "user:42"));
//! # Ok::<(), tiercache::Error>(())
//! ```

pub mod cache;
pub mod error;

// Re-export commonly used types
pub use cache::{
    CacheConfig, CacheLevelConfig, CacheLifecycle, CacheStats, LevelStats, MultiLevelCache,
    WarmupSummary,
};
pub use error::{Error, Result};
