//! Cache Statistics
//!
//! Snapshots derived from per-level counters on every call, so totals can't
//! drift from what the levels actually hold.

use std::collections::BTreeMap;

use serde::Serialize;

/// hits / (hits + misses), or 0 when nothing was looked up
#[inline]
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Statistics for one level
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelStats {
    /// Lookups answered by this level
    pub hits: u64,
    /// Lookups that scanned this level without a hit (absent or expired)
    pub misses: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Current number of entries
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Entries removed to make room
    pub evictions: u64,
}

/// Aggregate statistics plus the per-level breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Sum of level hits
    pub total_hits: u64,
    /// Lookups that missed every level
    pub total_misses: u64,
    /// total_hits / (total_hits + total_misses)
    pub hit_rate: f64,
    /// Sum of level sizes
    pub total_size: usize,
    /// Sum of level evictions
    pub evictions: u64,
    /// Per-level statistics keyed by level name
    pub levels: BTreeMap<String, LevelStats>,
}

impl CacheStats {
    /// Aggregate level snapshots with the global miss count
    pub fn aggregate(levels: BTreeMap<String, LevelStats>, total_misses: u64) -> Self {
        let total_hits = levels.values().map(|l| l.hits).sum();
        let total_size = levels.values().map(|l| l.size).sum();
        let evictions = levels.values().map(|l| l.evictions).sum();

        Self {
            total_hits,
            total_misses,
            hit_rate: hit_rate(total_hits, total_misses),
            total_size,
            evictions,
            levels,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn level(hits: u64, misses: u64, size: usize, evictions: u64) -> LevelStats {
        LevelStats {
            hits,
            misses,
            hit_rate: hit_rate(hits, misses),
            size,
            max_size: 100,
            evictions,
        }
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(hit_rate(0, 0), 0.0);
        assert_eq!(hit_rate(3, 1), 0.75);
        assert_eq!(hit_rate(5, 0), 1.0);
    }

    #[test]
    fn test_aggregate() {
        let mut levels = BTreeMap::new();
        levels.insert("L1".to_string(), level(6, 4, 10, 1));
        levels.insert("L2".to_string(), level(2, 2, 30, 2));

        let stats = CacheStats::aggregate(levels, 2);
        assert_eq!(stats.total_hits, 8);
        assert_eq!(stats.total_misses, 2);
        assert!((stats.hit_rate - 0.8).abs() < f64::EPSILON);
        assert_eq!(stats.total_size, 40);
        assert_eq!(stats.evictions, 3);
    }

    #[test]
    fn test_serializes_to_json() {
        let stats = CacheStats::aggregate(BTreeMap::new(), 0);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_hits"], 0);
        assert_eq!(json["hit_rate"], 0.0);
    }
}
