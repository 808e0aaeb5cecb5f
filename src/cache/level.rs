//! Level Store
//!
//! One independent key → entry map per configured level.
//!
//! # Design
//!
//! - Each level owns its own `RwLock`, so work on one level (a sweep, an
//!   eviction scan) never blocks lookups on another
//! - Hit/miss/eviction counters live inside the locked state and change
//!   together with the map they describe
//! - Capacity is an entry count; a new key arriving at a full level evicts
//!   the least recently used entry first

use std::collections::HashMap;

use parking_lot::RwLock;

use super::config::CacheLevelConfig;
use super::entry::{CacheEntry, EncodedValue};
use super::pattern::KeyPattern;
use super::policy;
use super::stats::{hit_rate, LevelStats};

/// Outcome of a level lookup
#[derive(Debug)]
pub enum Lookup {
    /// Live entry (already touched)
    Hit(CacheEntry),
    /// Entry was present but expired and has been removed
    Expired,
    /// No entry for the key
    Absent,
}

#[derive(Default)]
struct LevelState {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    /// Monotonic recency sequence for LRU ordering
    clock: u64,
}

impl LevelState {
    #[inline]
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// A single cache level
pub struct LevelStore {
    name: String,
    ttl_ms: u64,
    max_size: usize,
    priority: i32,
    state: RwLock<LevelState>,
}

impl LevelStore {
    /// Create an empty level. `ttl_ms` is the resolved default TTL.
    pub fn new(config: &CacheLevelConfig, ttl_ms: u64) -> Self {
        Self {
            name: config.name.clone(),
            ttl_ms,
            max_size: config.max_size,
            priority: config.priority,
            state: RwLock::new(LevelState::default()),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Look up a key, recording a hit or miss.
    ///
    /// Expired entries are removed on access and count as a miss.
    pub fn get(&self, key: &str, now: u64) -> Lookup {
        let mut state = self.state.write();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return Lookup::Absent;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            state.entries.remove(key);
            state.misses += 1;
            return Lookup::Expired;
        }

        let recency = state.tick();
        state.hits += 1;
        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.record_access(now, recency);
                Lookup::Hit(entry.clone())
            }
            None => Lookup::Absent,
        }
    }

    /// Read an entry without touching it or the counters
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.state.read().entries.get(key).cloned()
    }

    /// Store an encoded value with this level's TTL unless overridden.
    ///
    /// Returns the key evicted to make room, if any.
    pub fn insert(&self, key: &str, value: EncodedValue, ttl_override: Option<u64>) -> Option<String> {
        let ttl = ttl_override.unwrap_or(self.ttl_ms);
        self.put(CacheEntry::new(key, value, ttl))
    }

    /// Store an entry, evicting the LRU entry first if a new key would
    /// overflow the level. Returns the evicted key, if any.
    pub fn put(&self, mut entry: CacheEntry) -> Option<String> {
        let mut state = self.state.write();

        let mut evicted = None;
        if !state.entries.contains_key(entry.key()) && state.entries.len() >= self.max_size {
            if let Some(victim) = policy::lru_victim(&state.entries) {
                state.entries.remove(&victim);
                state.evictions += 1;
                tracing::debug!(level = %self.name, key = %victim, "Evicted least recently used entry");
                evicted = Some(victim);
            }
        }

        let recency = state.tick();
        entry.set_recency(recency);
        state.entries.insert(entry.key().to_string(), entry);

        evicted
    }

    /// Remove a key; returns whether it was present
    pub fn remove(&self, key: &str) -> bool {
        self.state.write().entries.remove(key).is_some()
    }

    /// Remove every key matching `pattern`; returns how many were removed
    pub fn remove_matching(&self, pattern: &KeyPattern) -> usize {
        let mut state = self.state.write();
        let before = state.entries.len();
        state.entries.retain(|key, _| !pattern.matches(key));
        before - state.entries.len()
    }

    /// Remove all entries expired at `now`; returns how many were removed
    pub fn purge_expired(&self, now: u64) -> usize {
        let mut state = self.state.write();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - state.entries.len()
    }

    /// Whether the key is stored (expired or not)
    pub fn contains(&self, key: &str) -> bool {
        self.state.read().entries.contains_key(key)
    }

    /// Snapshot of stored keys
    pub fn keys(&self) -> Vec<String> {
        self.state.read().entries.keys().cloned().collect()
    }

    /// Snapshot of stored entries
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.state.read().entries.values().cloned().collect()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether the level is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries (counters are kept)
    pub fn clear(&self) {
        self.state.write().entries.clear();
    }

    /// Zero the hit/miss/eviction counters
    pub fn reset_stats(&self) {
        let mut state = self.state.write();
        state.hits = 0;
        state.misses = 0;
        state.evictions = 0;
    }

    /// Get level statistics
    pub fn stats(&self) -> LevelStats {
        let state = self.state.read();
        LevelStats {
            hits: state.hits,
            misses: state.misses,
            hit_rate: hit_rate(state.hits, state.misses),
            size: state.entries.len(),
            max_size: self.max_size,
            evictions: state.evictions,
        }
    }
}

impl std::fmt::Debug for LevelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelStore")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("ttl_ms", &self.ttl_ms)
            .field("max_size", &self.max_size)
            .field("size", &self.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
