//! Multi-Level Cache
//!
//! In-process cache built from an ordered set of named levels, each with its
//! own TTL and capacity.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                          MultiLevelCache                                  │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │  get ─▶ L1 (prio 1) ─miss─▶ L2 (prio 2) ─miss─▶ L3 (prio 3) ─miss─▶ fetch │
//! │          ▲                   │                   │                │      │
//! │          └──── promote ──────┴───────────────────┘                │      │
//! │                                                                   ▼      │
//! │  set ─▶ every level          single-flight fetcher ─▶ store in all       │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │  serde_json ─▶ CompressionManager (LZ4 / custom) ─▶ EncodedValue         │
//! │  Expiry sweep (tokio interval)     Stats + Prometheus registry           │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Semantics
//!
//! - Lower priority value is checked first; ties keep configuration order
//! - A hit in a slower level copies the entry into every faster level with
//!   the faster level's TTL
//! - Expired entries are never returned; they are dropped on access and by
//!   the periodic sweep
//! - A full level evicts its least recently used entry when a new key arrives
//!
//! # Example
//!
//! ```
//! use tiercache::cache::{CacheConfig, MultiLevelCache};
//!
//! let cache = MultiLevelCache::new(CacheConfig::default()).unwrap();
//! cache.set("user:1", &"alice", None).unwrap();
//! assert_eq!(cache.get::<String>("user:1").as_deref(), Some("alice"));
//! ```

mod entry;
mod level;
mod manager;
mod metrics;
mod pattern;
mod policy;
mod stats;
mod sweeper;
pub mod compression;
pub mod config;

pub use compression::{CompressionAlgorithm, CompressionConfig, CompressionManager, Compressor};
pub use config::{CacheConfig, CacheLevelConfig};
pub use entry::{CacheEntry, EncodedValue};
pub use manager::{
    CacheLifecycle, EntrySummary, MultiLevelCache, WarmupSummary, EXPIRING_SOON_MS,
    LIFECYCLE_LIMIT,
};
pub use metrics::{CacheMetrics, FetchOutcome};
pub use pattern::KeyPattern;
pub use stats::{CacheStats, LevelStats};
