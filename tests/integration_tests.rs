//! tiercache Integration Tests
//!
//! Exercises the public cache API end to end:
//! - Read/write, TTL expiry and promotion across levels
//! - Eviction and statistics
//! - Invalidation, batch access, warmup and single-flight fetches
//! - Configuration loading and metrics exposition

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tiercache::{CacheConfig, CacheLevelConfig, MultiLevelCache};

fn two_level_cache() -> MultiLevelCache {
    let config = CacheConfig::with_levels(vec![
        CacheLevelConfig::new("L1", 60_000, 100, 1),
        CacheLevelConfig::new("L2", 300_000, 1_000, 2),
    ]);
    MultiLevelCache::new(config).unwrap()
}

// =============================================================================
// Core read/write behaviour
// =============================================================================

mod core_tests {
    use super::*;

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = two_level_cache();
        cache.set("k", &"v", Some(500)).unwrap();
        assert_eq!(cache.get::<String>("k").as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(cache.get::<String>("k"), None);

        // Expired entries are dropped on access from every level scanned
        assert!(!cache.contains_in_level("L1", "k"));
        assert!(!cache.contains_in_level("L2", "k"));
    }

    #[test]
    fn test_promotion_from_slower_level() {
        let cache = two_level_cache();
        cache.set_in_level("L2", "k", &42u32, None).unwrap();
        assert!(!cache.contains_in_level("L1", "k"));

        assert_eq!(cache.get::<u32>("k"), Some(42));
        assert!(cache.contains_in_level("L1", "k"));
    }

    #[test]
    fn test_lru_eviction() {
        let config = CacheConfig::with_levels(vec![CacheLevelConfig::new("L1", 60_000, 2, 1)]);
        let cache = MultiLevelCache::new(config).unwrap();

        cache.set("a", &1, None).unwrap();
        cache.set("b", &2, None).unwrap();
        // "a" accessed last, so "b" is the victim
        assert_eq!(cache.get::<i32>("a"), Some(1));
        cache.set("c", &3, None).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.levels["L1"].size, 2);
        assert_eq!(stats.levels["L1"].evictions, 1);

        let mut keys = cache.level_keys("L1").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_stats_hit_rate() {
        let config = CacheConfig::with_levels(vec![CacheLevelConfig::new("L1", 60_000, 10, 1)]);
        let cache = MultiLevelCache::new(config).unwrap();
        cache.set("k", &"v", None).unwrap();

        for _ in 0..3 {
            cache.get::<String>("k");
        }
        cache.get::<String>("nope");

        let stats = cache.stats();
        assert_eq!(stats.levels["L1"].hit_rate, 0.75);
        let expected = stats.total_hits as f64 / (stats.total_hits + stats.total_misses) as f64;
        assert_eq!(stats.hit_rate, expected);
    }

    #[test]
    fn test_pattern_invalidation() {
        let cache = two_level_cache();
        for key in ["user:1", "user:2", "order:1"] {
            cache.set(key, &key, None).unwrap();
        }

        cache.invalidate("user:*");

        for level in cache.level_names() {
            assert_eq!(cache.level_keys(level).unwrap(), vec!["order:1".to_string()]);
        }
    }

    #[test]
    fn test_invalidate_unmatched_pattern_removes_nothing() {
        let cache = two_level_cache();
        cache.set("user:1", &1, None).unwrap();

        assert_eq!(cache.invalidate("session:*"), 0);
        assert_eq!(cache.invalidate("[unclosed"), 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_heterogeneous_values() {
        let cache = two_level_cache();
        cache.set("count", &7u64, None).unwrap();
        cache.set("tags", &vec!["a", "b"], None).unwrap();
        cache
            .set("scores", &HashMap::from([("x".to_string(), 1.5f64)]), None)
            .unwrap();

        assert_eq!(cache.get::<u64>("count"), Some(7));
        assert_eq!(cache.get::<Vec<String>>("tags").unwrap(), vec!["a", "b"]);
        assert_eq!(cache.get::<HashMap<String, f64>>("scores").unwrap()["x"], 1.5);
    }
}

// =============================================================================
// Fetch paths
// =============================================================================

mod fetch_tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_get_fetches_exactly_missing_keys() {
        let cache = two_level_cache();
        cache.set("k1", &"x", None).unwrap();

        let requested = Arc::new(parking_lot::Mutex::new(None));
        let seen = Arc::clone(&requested);

        let keys = vec!["k1".to_string(), "k2".to_string()];
        let result: HashMap<String, String> = cache
            .batch_get_with(&keys, |missing| async move {
                *seen.lock() = Some(missing);
                Ok(HashMap::from([("k2".to_string(), "y".to_string())]))
            })
            .await;

        assert_eq!(*requested.lock(), Some(vec!["k2".to_string()]));
        assert_eq!(result.get("k1").map(String::as_str), Some("x"));
        assert_eq!(result.get("k2").map(String::as_str), Some("y"));
    }

    #[tokio::test]
    async fn test_single_flight_concurrent_gets() {
        let cache = two_level_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_fetcher = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, anyhow::Error>(String::from("loaded"))
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch::<String, _, _>("k", slow_fetcher(Arc::clone(&calls))),
            cache.get_or_fetch::<String, _, _>("k", slow_fetcher(Arc::clone(&calls))),
        );

        assert_eq!(a.as_deref(), Some("loaded"));
        assert_eq!(b.as_deref(), Some("loaded"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pending_fetches(), 0);
    }

    #[tokio::test]
    async fn test_fetcher_error_is_a_miss() {
        let cache = two_level_cache();
        let value: Option<u32> = cache
            .get_or_fetch("k", || async { Err(anyhow::anyhow!("origin unavailable")) })
            .await;

        assert_eq!(value, None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_warmup_loads_all_levels() {
        let cache = two_level_cache();
        let keys: Vec<String> = (0..10).map(|i| format!("item:{}", i)).collect();

        let summary = tokio_test::block_on(cache.warmup(&keys, |key| async move {
            Ok(key.len())
        }));

        assert_eq!(summary.loaded, 10);
        assert_eq!(summary.failed, 0);
        assert_eq!(cache.stats().total_size, 20);
    }

    #[tokio::test]
    async fn test_warmup_fetches_run_concurrently() {
        let cache = two_level_cache();
        let keys: Vec<String> = (0..10).map(|i| format!("slow:{}", i)).collect();

        let started = std::time::Instant::now();
        let summary = cache
            .warmup(&keys, |key| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(key)
            })
            .await;
        let elapsed = started.elapsed();

        assert_eq!(summary.loaded, 10);
        // Sequential fetching would take 500ms
        assert!(elapsed < Duration::from_millis(250), "warmup took {:?}", elapsed);
    }
}

// =============================================================================
// Configuration, introspection and metrics
// =============================================================================

mod operations_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_yaml_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "levels:\n  - name: hot\n    ttl_ms: 1000\n    max_size: 10\n    priority: 0\n  - name: warm\n    max_size: 100\n    priority: 5\ndefault_ttl_ms: 30000\nenable_metrics: true\n"
        )
        .unwrap();

        let config = CacheConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.level_ttl_ms(&config.levels[1]), 30_000);

        let cache = MultiLevelCache::new(config).unwrap();
        assert_eq!(cache.level_names(), vec!["hot", "warm"]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = CacheConfig::with_levels(vec![CacheLevelConfig::new("L1", 1_000, 0, 1)]);
        assert!(matches!(
            MultiLevelCache::new(config),
            Err(tiercache::Error::Config(_))
        ));
    }

    #[test]
    fn test_lifecycle_lists_are_bounded() {
        let config = CacheConfig::with_levels(vec![CacheLevelConfig::new("L1", 30_000, 100, 1)]);
        let cache = MultiLevelCache::new(config).unwrap();
        for i in 0..25 {
            cache.set(&format!("k{}", i), &i, None).unwrap();
        }

        let lifecycle = cache.lifecycle();
        assert_eq!(lifecycle.oldest_entries.len(), 10);
        assert_eq!(lifecycle.most_accessed.len(), 10);
        assert_eq!(lifecycle.expiring_soon.len(), 10);
        assert!(lifecycle
            .expiring_soon
            .windows(2)
            .all(|w| w[0].ttl_remaining_ms <= w[1].ttl_remaining_ms));
    }

    #[test]
    fn test_metrics_exposition() {
        let mut config = CacheConfig::default();
        config.enable_metrics = true;
        let cache = MultiLevelCache::new(config).unwrap();

        cache.set("k", &1, None).unwrap();
        cache.get::<i32>("k");
        cache.get::<i32>("missing");

        let text = cache.encode_metrics().unwrap();
        assert!(text.contains("tiercache_hits_total{level=\"L1\"} 1"));
        assert!(text.contains("tiercache_misses_total{level=\"L3\"} 1"));
        assert!(text.contains("tiercache_entries{level=\"L3\"} 1"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweep() {
        let cache = two_level_cache();
        cache.start_expiry_sweep().unwrap();
        assert!(cache.is_sweeping());

        cache.shutdown();
        assert!(!cache.is_sweeping());
        assert!(cache.set("k", &1, None).is_err());
    }
}
