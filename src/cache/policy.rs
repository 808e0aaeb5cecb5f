//! Cache Eviction and Promotion Policies
//!
//! Decisions about which entry leaves a full level and which levels receive a
//! copy of an entry found further down the hierarchy.

use std::collections::HashMap;

use super::config::CacheLevelConfig;
use super::entry::CacheEntry;

/// Least-recently-used victim of a level.
///
/// Picks the entry with the oldest recency sequence. Insertion counts as an
/// access, so an untouched entry ages from the moment it was written.
pub fn lru_victim(entries: &HashMap<String, CacheEntry>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, entry)| (entry.recency(), entry.last_accessed_ms()))
        .map(|(key, _)| key.clone())
}

/// Indices of `levels` in lookup order: ascending priority, ties kept in
/// configuration order.
pub fn lookup_order(levels: &[CacheLevelConfig]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    order.sort_by_key(|&i| levels[i].priority);
    order
}

/// Positions (in lookup order) that receive a copy when `source` hits.
///
/// Only levels with a strictly lower priority value qualify; an
/// equal-priority sibling is never written.
pub fn promotion_targets(priorities: &[i32], source: usize) -> Vec<usize> {
    let source_priority = priorities[source];
    priorities
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p < source_priority)
        .map(|(i, _)| i)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::EncodedValue;
    use bytes::Bytes;
    use proptest::prelude::*;

    fn entry_with_recency(key: &str, recency: u64) -> CacheEntry {
        let mut entry = CacheEntry::at(key, EncodedValue::plain(Bytes::from_static(b"v")), 1000, 0);
        entry.set_recency(recency);
        entry
    }

    #[test]
    fn test_lru_victim_is_oldest() {
        let mut entries = HashMap::new();
        entries.insert("a".to_string(), entry_with_recency("a", 3));
        entries.insert("b".to_string(), entry_with_recency("b", 1));
        entries.insert("c".to_string(), entry_with_recency("c", 2));

        assert_eq!(lru_victim(&entries), Some("b".to_string()));
    }

    #[test]
    fn test_lru_victim_empty() {
        assert_eq!(lru_victim(&HashMap::new()), None);
    }

    #[test]
    fn test_lookup_order_is_stable() {
        let levels = vec![
            CacheLevelConfig::new("cold", 1000, 10, 3),
            CacheLevelConfig::new("hot-a", 1000, 10, 1),
            CacheLevelConfig::new("warm", 1000, 10, 2),
            CacheLevelConfig::new("hot-b", 1000, 10, 1),
        ];
        assert_eq!(lookup_order(&levels), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_promotion_targets_strictly_faster() {
        let priorities = [1, 1, 2, 3];
        assert_eq!(promotion_targets(&priorities, 3), vec![0, 1, 2]);
        assert_eq!(promotion_targets(&priorities, 2), vec![0, 1]);
        // Equal-priority sibling is not a target
        assert!(promotion_targets(&priorities, 1).is_empty());
        assert!(promotion_targets(&priorities, 0).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_lru_victim_has_minimum_recency(recencies in prop::collection::hash_set(0u64..10_000, 1..50)) {
            let entries: HashMap<String, CacheEntry> = recencies
                .iter()
                .map(|&r| {
                    let key = format!("k{}", r);
                    (key.clone(), entry_with_recency(&key, r))
                })
                .collect();

            let victim = lru_victim(&entries).unwrap();
            let min = recencies.iter().min().unwrap();
            prop_assert_eq!(victim, format!("k{}", min));
        }
    }
}
