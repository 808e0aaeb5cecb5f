//! Cache Manager - Unified Multi-Level Cache
//!
//! Orchestrates the configured levels: priority-ordered lookup with promotion,
//! fan-out writes, invalidation, batch access, warmup and single-flight fetches
//! on miss.
//!
//! Values cross the cache boundary through `serde_json`, so one instance can
//! hold heterogeneous value types. A stored value that doesn't deserialize
//! into the requested type is reported as a miss.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::compression::{CompressionManager, Compressor};
use super::config::CacheConfig;
use super::entry::{now_ms, CacheEntry, EncodedValue};
use super::level::{LevelStore, Lookup};
use super::metrics::{CacheMetrics, FetchOutcome, LatencyTracker};
use super::pattern::KeyPattern;
use super::policy;
use super::stats::CacheStats;
use super::sweeper::SweepHandle;
use crate::error::{Error, Result};

/// Entries closer than this to expiry are reported as expiring soon
pub const EXPIRING_SOON_MS: u64 = 60 * 1000;

/// Maximum entries per lifecycle list
pub const LIFECYCLE_LIMIT: usize = 10;

type PendingFetch = Shared<BoxFuture<'static, Option<Bytes>>>;

/// Result of a warmup run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmupSummary {
    /// Keys fetched and stored
    pub loaded: usize,
    /// Keys whose fetch or store failed
    pub failed: usize,
}

/// One entry as seen by lifecycle introspection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub level: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub age_ms: u64,
    pub access_count: u64,
    pub ttl_remaining_ms: u64,
}

/// Operator view of what the cache currently holds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheLifecycle {
    /// Oldest entries first
    pub oldest_entries: Vec<EntrySummary>,
    /// Most accessed entries first
    pub most_accessed: Vec<EntrySummary>,
    /// Live entries expiring within a minute, soonest first
    pub expiring_soon: Vec<EntrySummary>,
}

// =============================================================================
// Shared core
// =============================================================================

/// State shared between the public handle, the sweep task and in-flight
/// fetches.
pub(crate) struct CacheCore {
    /// Levels in lookup order
    levels: Vec<LevelStore>,
    /// Priority of each level, same order as `levels`
    priorities: Vec<i32>,
    compression: CompressionManager,
    metrics: Option<CacheMetrics>,
    /// Lookups that missed every level
    total_misses: AtomicU64,
    /// Fetches in flight, keyed by cache key, tagged with a fetch id
    pending: DashMap<String, (u64, PendingFetch)>,
    next_fetch_id: AtomicU64,
    shut_down: AtomicBool,
    sweeping: AtomicBool,
}

impl CacheCore {
    fn new(config: &CacheConfig, compression: CompressionManager) -> Result<Self> {
        let levels: Vec<LevelStore> = policy::lookup_order(&config.levels)
            .into_iter()
            .map(|i| {
                let level = &config.levels[i];
                LevelStore::new(level, config.level_ttl_ms(level))
            })
            .collect();
        let priorities = levels.iter().map(|l| l.priority()).collect();

        let metrics = if config.enable_metrics {
            Some(CacheMetrics::new()?)
        } else {
            None
        };

        Ok(Self {
            levels,
            priorities,
            compression,
            metrics,
            total_misses: AtomicU64::new(0),
            pending: DashMap::new(),
            next_fetch_id: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
            sweeping: AtomicBool::new(false),
        })
    }

    fn level(&self, name: &str) -> Option<&LevelStore> {
        self.levels.iter().find(|l| l.name() == name)
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Scan levels in priority order; promote and return the encoded value
    /// on the first live hit.
    fn lookup(&self, key: &str) -> Option<EncodedValue> {
        let now = now_ms();

        for (pos, level) in self.levels.iter().enumerate() {
            match level.get(key, now) {
                Lookup::Hit(entry) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_hit(level.name());
                    }
                    self.promote(pos, &entry);
                    return Some(entry.value().clone());
                }
                Lookup::Expired => {
                    debug!(level = level.name(), key, "Dropped expired entry on read");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_miss(level.name());
                    }
                }
                Lookup::Absent => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_miss(level.name());
                    }
                }
            }
        }

        self.total_misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Copy an entry hit at `source` into every faster level
    fn promote(&self, source: usize, entry: &CacheEntry) {
        for target in policy::promotion_targets(&self.priorities, source) {
            let level = &self.levels[target];
            let evicted = level.put(entry.promoted(level.ttl_ms()));
            self.note_eviction(level, evicted);
            debug!(
                key = entry.key(),
                from = self.levels[source].name(),
                to = level.name(),
                "Promoted entry"
            );
        }
    }

    fn note_eviction(&self, level: &LevelStore, evicted: Option<String>) {
        if evicted.is_some() {
            if let Some(metrics) = &self.metrics {
                metrics.record_eviction(level.name());
            }
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<EncodedValue> {
        let serialized = serde_json::to_vec(value)?;
        Ok(self.compression.compress(&serialized))
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, value: &EncodedValue) -> Option<T> {
        let bytes = match self.compression.decompress(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, "Failed to decompress cached value: {}", e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key, "Cached value does not match the requested type: {}", e);
                None
            }
        }
    }

    /// Write an encoded value to every level
    fn store(&self, key: &str, value: EncodedValue, ttl_ms: Option<u64>) -> Result<()> {
        if self.is_shut_down() {
            return Err(Error::ShutDown);
        }
        for level in &self.levels {
            let evicted = level.insert(key, value.clone(), ttl_ms);
            self.note_eviction(level, evicted);
        }
        Ok(())
    }

    /// Write an encoded value to one named level
    fn store_in_level(
        &self,
        level_name: &str,
        key: &str,
        value: EncodedValue,
        ttl_ms: Option<u64>,
    ) -> Result<()> {
        if self.is_shut_down() {
            return Err(Error::ShutDown);
        }
        let level = self
            .level(level_name)
            .ok_or_else(|| Error::UnknownLevel(level_name.to_string()))?;
        let evicted = level.insert(key, value, ttl_ms);
        self.note_eviction(level, evicted);
        Ok(())
    }

    /// Remove expired entries from every level. Returns 0 without doing
    /// anything if another sweep is already running.
    pub(crate) fn sweep_expired(&self) -> usize {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Expiry sweep already running, skipping");
            return 0;
        }

        let now = now_ms();
        let removed = self.levels.iter().map(|level| level.purge_expired(now)).sum();

        self.sweeping.store(false, Ordering::Release);
        removed
    }

    /// Newest live copy of `key` in any level, decoded to serialized bytes.
    /// Touches no counters.
    fn peek_fresh(&self, key: &str) -> Option<Bytes> {
        let now = now_ms();
        let entry = self
            .levels
            .iter()
            .filter_map(|level| level.peek(key))
            .find(|entry| !entry.is_expired_at(now))?;
        self.compression.decompress(entry.value()).ok()
    }

    /// Run `start` at most once per key at a time; concurrent callers await
    /// the same result. The fetched bytes are stored in every level unless
    /// the cache was shut down meanwhile.
    ///
    /// The fetch runs as its own tokio task, so it completes and leaves the
    /// pending map even if every caller awaiting it is dropped.
    async fn fetch_coalesced<F>(core: &Arc<Self>, key: &str, start: F) -> Option<Bytes>
    where
        F: FnOnce() -> BoxFuture<'static, anyhow::Result<Bytes>>,
    {
        let fetch = match core.pending.entry(key.to_string()) {
            Entry::Occupied(existing) => {
                debug!(key, "Joining in-flight fetch");
                if let Some(metrics) = &core.metrics {
                    metrics.record_fetch(FetchOutcome::Coalesced);
                }
                existing.get().1.clone()
            }
            Entry::Vacant(slot) => {
                // A fetch that finished since our lookup already stored the value
                if let Some(bytes) = core.peek_fresh(key) {
                    return Some(bytes);
                }

                let id = core.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                let work = Self::run_fetch(Arc::clone(core), key.to_string(), id, start());

                let fetch = match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        let task = runtime.spawn(work);
                        let core = Arc::clone(core);
                        let key = key.to_string();
                        async move {
                            match task.await {
                                Ok(bytes) => bytes,
                                Err(e) => {
                                    core.pending.remove_if(&key, |_, (pending_id, _)| *pending_id == id);
                                    warn!(key = %key, operation = "get", "Fetch task failed: {}", e);
                                    None
                                }
                            }
                        }
                        .boxed()
                    }
                    Err(_) => work.boxed(),
                }
                .shared();

                slot.insert((id, fetch.clone()));
                fetch
            }
        };

        fetch.await
    }

    /// Await the fetcher, store its value, then release the pending slot
    async fn run_fetch(
        core: Arc<Self>,
        key: String,
        id: u64,
        source: BoxFuture<'static, anyhow::Result<Bytes>>,
    ) -> Option<Bytes> {
        let tracker = LatencyTracker::start();
        let result = source.await;

        if let Some(metrics) = &core.metrics {
            metrics.observe_fetch_duration(tracker.elapsed());
        }

        let fetched = match result {
            Ok(bytes) => {
                if let Some(metrics) = &core.metrics {
                    metrics.record_fetch(FetchOutcome::Ok);
                }
                if core.is_shut_down() {
                    debug!(key = %key, "Cache shut down, discarding fetched value");
                } else {
                    let encoded = core.compression.compress(&bytes);
                    if let Err(e) = core.store(&key, encoded, None) {
                        warn!(key = %key, "Failed to store fetched value: {}", e);
                    }
                }
                Some(bytes)
            }
            Err(e) => {
                if let Some(metrics) = &core.metrics {
                    metrics.record_fetch(FetchOutcome::Error);
                }
                warn!(key = %key, operation = "get", "Fetcher failed: {:#}", e);
                None
            }
        };

        // Released only after the store so a racing miss finds the value
        core.pending.remove_if(&key, |_, (pending_id, _)| *pending_id == id);
        fetched
    }
}

// =============================================================================
// Public handle
// =============================================================================

/// Multi-level in-process cache
pub struct MultiLevelCache {
    core: Arc<CacheCore>,
    config: CacheConfig,
    sweeper: Mutex<Option<SweepHandle>>,
}

impl MultiLevelCache {
    /// Create a cache, compressing with LZ4 when `enable_compression` is set
    pub fn new(config: CacheConfig) -> Result<Self> {
        let compression = CompressionManager::new(config.compression());
        Self::build(config, compression)
    }

    /// Create a cache with a caller-supplied compression strategy
    pub fn with_compressor(config: CacheConfig, compressor: Arc<dyn Compressor>) -> Result<Self> {
        let compression = CompressionManager::with_compressor(config.compression(), compressor);
        Self::build(config, compression)
    }

    fn build(config: CacheConfig, compression: CompressionManager) -> Result<Self> {
        config.validate()?;
        let core = CacheCore::new(&config, compression)?;

        info!(
            levels = ?core.levels.iter().map(|l| l.name()).collect::<Vec<_>>(),
            compression = config.enable_compression,
            metrics = config.enable_metrics,
            "Created multi-level cache"
        );

        Ok(Self {
            core: Arc::new(core),
            config,
            sweeper: Mutex::new(None),
        })
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Look up a key across all levels; `None` on miss
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.core.lookup(key)?;
        self.core.decode(key, &value)
    }

    /// Look up a key, calling `fetcher` on a miss.
    ///
    /// Concurrent misses for the same key share one fetcher call. A fetched
    /// value is stored in every level. Fetcher errors are logged and reported
    /// as `None`.
    #[instrument(skip(self, fetcher))]
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetcher: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        if let Some(value) = self.core.lookup(key) {
            if let Some(decoded) = self.core.decode(key, &value) {
                return Some(decoded);
            }
        }

        let bytes = CacheCore::fetch_coalesced(&self.core, key, move || {
            async move {
                let value = fetcher().await?;
                let serialized = serde_json::to_vec(&value)?;
                Ok::<_, anyhow::Error>(Bytes::from(serialized))
            }
            .boxed()
        })
        .await?;

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "Fetched value does not match the requested type: {}", e);
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Store a value in every level, each with `ttl_ms` or its own TTL
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_ms: Option<u64>) -> Result<()> {
        let encoded = self.core.encode(value)?;
        self.core.store(key, encoded, ttl_ms)
    }

    /// Store a value in one named level only
    pub fn set_in_level<T: Serialize + ?Sized>(
        &self,
        level: &str,
        key: &str,
        value: &T,
        ttl_ms: Option<u64>,
    ) -> Result<()> {
        let encoded = self.core.encode(value)?;
        self.core.store_in_level(level, key, encoded, ttl_ms)
    }

    /// Remove a key from every level; returns whether anything was removed
    pub fn delete(&self, key: &str) -> bool {
        self.core
            .levels
            .iter()
            .fold(false, |removed, level| level.remove(key) | removed)
    }

    /// Remove every key matching `pattern` from every level.
    ///
    /// `*` makes the pattern a whole-key glob; otherwise keys containing the
    /// pattern match. Returns the number of entries removed.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let matcher = KeyPattern::parse(pattern);
        let removed = self
            .core
            .levels
            .iter()
            .map(|level| level.remove_matching(&matcher))
            .sum();
        debug!(pattern, removed, "Invalidated entries");
        removed
    }

    /// Drop every entry from every level
    pub fn clear(&self) {
        for level in &self.core.levels {
            level.clear();
        }
    }

    // -------------------------------------------------------------------------
    // Batch operations
    // -------------------------------------------------------------------------

    /// Look up many keys; misses are left out of the result
    pub fn batch_get<T: DeserializeOwned>(&self, keys: &[String]) -> HashMap<String, T> {
        self.partition(keys).0
    }

    /// Look up many keys and fetch all misses with a single `fetcher` call.
    ///
    /// The fetcher receives exactly the keys that missed, in request order.
    /// Keys it doesn't return are left out of the result.
    #[instrument(skip(self, keys, fetcher), fields(keys = keys.len()))]
    pub async fn batch_get_with<T, F, Fut>(&self, keys: &[String], fetcher: F) -> HashMap<String, T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Vec<String>) -> Fut,
        Fut: Future<Output = anyhow::Result<HashMap<String, T>>>,
    {
        let (mut found, missing) = self.partition::<T>(keys);
        if missing.is_empty() {
            return found;
        }

        match fetcher(missing).await {
            Ok(fetched) => {
                for (key, value) in fetched {
                    if let Err(e) = self.set(&key, &value, None) {
                        warn!(key = %key, operation = "batch_get", "Failed to store fetched value: {}", e);
                    }
                    found.insert(key, value);
                }
            }
            Err(e) => {
                warn!(operation = "batch_get", "Batch fetcher failed: {:#}", e);
            }
        }

        found
    }

    /// Split keys into cached values and distinct missing keys
    fn partition<T: DeserializeOwned>(&self, keys: &[String]) -> (HashMap<String, T>, Vec<String>) {
        let mut found = HashMap::new();
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for key in keys {
            if !seen.insert(key.as_str()) {
                continue;
            }
            match self.get::<T>(key) {
                Some(value) => {
                    found.insert(key.clone(), value);
                }
                None => missing.push(key.clone()),
            }
        }

        (found, missing)
    }

    /// Store many entries independently; returns how many were stored
    pub fn batch_set<T: Serialize>(&self, entries: Vec<(String, T, Option<u64>)>) -> usize {
        let mut stored = 0;
        for (key, value, ttl_ms) in entries {
            match self.set(&key, &value, ttl_ms) {
                Ok(()) => stored += 1,
                Err(e) => warn!(key = %key, operation = "batch_set", "Failed to store entry: {}", e),
            }
        }
        stored
    }

    /// Fetch and store every key concurrently. Failures are logged and
    /// skipped; warmup never fails as a whole.
    #[instrument(skip(self, keys, fetcher), fields(keys = keys.len()))]
    pub async fn warmup<T, F, Fut>(&self, keys: &[String], fetcher: F) -> WarmupSummary
    where
        T: Serialize,
        F: Fn(String) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let outcomes = join_all(keys.iter().map(|key| {
            let fetch = fetcher(key.clone());
            async move {
                match fetch.await {
                    Ok(value) => match self.set(key, &value, None) {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(key = %key, operation = "warmup", "Failed to store value: {}", e);
                            false
                        }
                    },
                    Err(e) => {
                        warn!(key = %key, operation = "warmup", "Fetcher failed: {:#}", e);
                        false
                    }
                }
            }
        }))
        .await;

        let loaded = outcomes.iter().filter(|ok| **ok).count();
        let summary = WarmupSummary {
            loaded,
            failed: outcomes.len() - loaded,
        };
        info!(loaded = summary.loaded, failed = summary.failed, "Cache warmup complete");
        summary
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Aggregate and per-level statistics
    pub fn stats(&self) -> CacheStats {
        let levels: BTreeMap<_, _> = self
            .core
            .levels
            .iter()
            .map(|level| (level.name().to_string(), level.stats()))
            .collect();
        CacheStats::aggregate(levels, self.core.total_misses.load(Ordering::Relaxed))
    }

    /// Zero all hit/miss/eviction counters
    pub fn reset_stats(&self) {
        for level in &self.core.levels {
            level.reset_stats();
        }
        self.core.total_misses.store(0, Ordering::Relaxed);
    }

    /// Oldest, most accessed and soon-to-expire entries across all levels
    pub fn lifecycle(&self) -> CacheLifecycle {
        let now = now_ms();
        let summaries: Vec<(EntrySummary, u64)> = self
            .core
            .levels
            .iter()
            .flat_map(|level| {
                level.entries().into_iter().map(move |entry| {
                    let summary = EntrySummary {
                        level: level.name().to_string(),
                        key: entry.key().to_string(),
                        created_at: Utc
                            .timestamp_millis_opt(entry.timestamp_ms() as i64)
                            .single()
                            .unwrap_or_else(Utc::now),
                        age_ms: now.saturating_sub(entry.timestamp_ms()),
                        access_count: entry.access_count(),
                        ttl_remaining_ms: entry.ttl_remaining_ms(now),
                    };
                    (summary, entry.timestamp_ms())
                })
            })
            .collect();

        let mut oldest = summaries.clone();
        oldest.sort_by_key(|(_, created)| *created);

        let mut most_accessed: Vec<EntrySummary> = summaries.iter().map(|(s, _)| s.clone()).collect();
        most_accessed.sort_by(|a, b| b.access_count.cmp(&a.access_count));

        let mut expiring_soon: Vec<EntrySummary> = summaries
            .into_iter()
            .map(|(s, _)| s)
            .filter(|s| s.ttl_remaining_ms > 0 && s.ttl_remaining_ms < EXPIRING_SOON_MS)
            .collect();
        expiring_soon.sort_by_key(|s| s.ttl_remaining_ms);

        CacheLifecycle {
            oldest_entries: oldest
                .into_iter()
                .take(LIFECYCLE_LIMIT)
                .map(|(s, _)| s)
                .collect(),
            most_accessed: most_accessed.into_iter().take(LIFECYCLE_LIMIT).collect(),
            expiring_soon: expiring_soon.into_iter().take(LIFECYCLE_LIMIT).collect(),
        }
    }

    /// Level names in lookup order
    pub fn level_names(&self) -> Vec<&str> {
        self.core.levels.iter().map(|l| l.name()).collect()
    }

    /// Whether `key` is stored in the named level (no stats, no touch)
    pub fn contains_in_level(&self, level: &str, key: &str) -> bool {
        self.core.level(level).is_some_and(|l| l.contains(key))
    }

    /// Keys stored in the named level
    pub fn level_keys(&self, level: &str) -> Option<Vec<String>> {
        self.core.level(level).map(|l| l.keys())
    }

    /// Total entries across all levels
    pub fn len(&self) -> usize {
        self.core.levels.iter().map(|l| l.len()).sum()
    }

    /// Whether every level is empty
    pub fn is_empty(&self) -> bool {
        self.core.levels.iter().all(|l| l.is_empty())
    }

    /// Number of fetches currently in flight
    pub fn pending_fetches(&self) -> usize {
        self.core.pending.len()
    }

    /// Get configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Prometheus text exposition of this cache's metrics (empty when
    /// metrics are disabled)
    pub fn encode_metrics(&self) -> Result<String> {
        match &self.core.metrics {
            Some(metrics) => {
                for level in &self.core.levels {
                    metrics.set_entries(level.name(), level.len());
                }
                metrics.encode()
            }
            None => Ok(String::new()),
        }
    }

    // -------------------------------------------------------------------------
    // Expiry and shutdown
    // -------------------------------------------------------------------------

    /// Purge expired entries from every level now
    pub fn sweep_expired(&self) -> usize {
        self.core.sweep_expired()
    }

    /// Start the periodic expiry sweep on the current tokio runtime.
    /// Calling it again while the sweep is running does nothing.
    pub fn start_expiry_sweep(&self) -> Result<()> {
        if self.core.is_shut_down() {
            return Err(Error::ShutDown);
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(Error::Internal(
                "expiry sweep requires a running tokio runtime".into(),
            ));
        }

        let mut sweeper = self.sweeper.lock();
        if sweeper.as_ref().is_some_and(|s| !s.is_finished()) {
            return Ok(());
        }
        *sweeper = Some(SweepHandle::spawn(
            Arc::clone(&self.core),
            self.config.sweep_interval(),
        ));
        Ok(())
    }

    /// Whether the periodic sweep task is running
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().as_ref().is_some_and(|s| !s.is_finished())
    }

    /// Stop the sweep, abandon in-flight fetches and refuse further writes.
    ///
    /// Callers already awaiting a fetch still receive its result, but it is
    /// not stored.
    pub fn shutdown(&self) {
        if self.core.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.cancel();
        }
        self.core.pending.clear();
        info!("Multi-level cache shut down");
    }

    /// Whether `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.core.is_shut_down()
    }
}

impl Drop for MultiLevelCache {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.cancel();
        }
    }
}

impl std::fmt::Debug for MultiLevelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiLevelCache")
            .field("levels", &self.core.levels)
            .field("shut_down", &self.core.is_shut_down())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
