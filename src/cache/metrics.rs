//! Cache Metrics Export
//!
//! Prometheus counters mirroring the internal statistics, registered in a
//! registry owned by the cache instance so several caches can coexist in one
//! process.

use std::time::{Duration, Instant};

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::error::{Error, Result};

/// How a fetch issued on a miss ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetcher returned a value
    Ok,
    /// Fetcher failed
    Error,
    /// Caller joined a fetch already in flight
    Coalesced,
}

impl FetchOutcome {
    fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::Error => "error",
            FetchOutcome::Coalesced => "coalesced",
        }
    }
}

/// Prometheus metrics for one cache instance
pub struct CacheMetrics {
    registry: Registry,
    hits: IntCounterVec,
    misses: IntCounterVec,
    evictions: IntCounterVec,
    entries: IntGaugeVec,
    fetches: IntCounterVec,
    fetch_duration: Histogram,
}

impl CacheMetrics {
    /// Create and register all collectors
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let hits = IntCounterVec::new(
            Opts::new("tiercache_hits_total", "Lookups answered by a level"),
            &["level"],
        )?;
        let misses = IntCounterVec::new(
            Opts::new("tiercache_misses_total", "Lookups that scanned a level without a hit"),
            &["level"],
        )?;
        let evictions = IntCounterVec::new(
            Opts::new("tiercache_evictions_total", "Entries evicted to make room"),
            &["level"],
        )?;
        let entries = IntGaugeVec::new(
            Opts::new("tiercache_entries", "Entries currently held by a level"),
            &["level"],
        )?;
        let fetches = IntCounterVec::new(
            Opts::new("tiercache_fetches_total", "Fetches issued on cache misses"),
            &["outcome"],
        )?;
        let fetch_duration = Histogram::with_opts(HistogramOpts::new(
            "tiercache_fetch_duration_seconds",
            "Latency of fetcher calls issued on cache misses",
        ))?;

        registry.register(Box::new(hits.clone()))?;
        registry.register(Box::new(misses.clone()))?;
        registry.register(Box::new(evictions.clone()))?;
        registry.register(Box::new(entries.clone()))?;
        registry.register(Box::new(fetches.clone()))?;
        registry.register(Box::new(fetch_duration.clone()))?;

        Ok(Self {
            registry,
            hits,
            misses,
            evictions,
            entries,
            fetches,
            fetch_duration,
        })
    }

    pub fn record_hit(&self, level: &str) {
        self.hits.with_label_values(&[level]).inc();
    }

    pub fn record_miss(&self, level: &str) {
        self.misses.with_label_values(&[level]).inc();
    }

    pub fn record_eviction(&self, level: &str) {
        self.evictions.with_label_values(&[level]).inc();
    }

    pub fn set_entries(&self, level: &str, entries: usize) {
        self.entries.with_label_values(&[level]).set(entries as i64);
    }

    pub fn record_fetch(&self, outcome: FetchOutcome) {
        self.fetches.with_label_values(&[outcome.label()]).inc();
    }

    pub fn observe_fetch_duration(&self, duration: Duration) {
        self.fetch_duration.observe(duration.as_secs_f64());
    }

    /// Registry holding this cache's collectors
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the text exposition format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Internal(format!("Metrics output is not UTF-8: {}", e)))
    }
}

/// Latency tracker helper
pub struct LatencyTracker {
    start: Instant,
}

impl LatencyTracker {
    /// Start tracking latency
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = CacheMetrics::new().unwrap();
        assert!(metrics.registry().gather().len() <= 6);
    }

    #[test]
    fn test_counters_render() {
        let metrics = CacheMetrics::new().unwrap();
        metrics.record_hit("L1");
        metrics.record_hit("L1");
        metrics.record_miss("L2");
        metrics.record_eviction("L1");
        metrics.set_entries("L1", 42);
        metrics.record_fetch(FetchOutcome::Coalesced);
        metrics.observe_fetch_duration(Duration::from_millis(5));

        let text = metrics.encode().unwrap();
        assert!(text.contains("tiercache_hits_total{level=\"L1\"} 2"));
        assert!(text.contains("tiercache_misses_total{level=\"L2\"} 1"));
        assert!(text.contains("tiercache_evictions_total{level=\"L1\"} 1"));
        assert!(text.contains("tiercache_entries{level=\"L1\"} 42"));
        assert!(text.contains("tiercache_fetches_total{outcome=\"coalesced\"} 1"));
        assert!(text.contains("tiercache_fetch_duration_seconds_count 1"));
    }

    #[test]
    fn test_independent_registries() {
        // Two caches in one process must not collide on registration
        let a = CacheMetrics::new().unwrap();
        let b = CacheMetrics::new().unwrap();
        a.record_hit("L1");

        assert!(a.encode().unwrap().contains("tiercache_hits_total{level=\"L1\"} 1"));
        assert!(!b.encode().unwrap().contains("tiercache_hits_total{level=\"L1\"}"));
    }

    #[test]
    fn test_latency_tracker() {
        let tracker = LatencyTracker::start();
        std::thread::sleep(Duration::from_millis(10));
        assert!(tracker.elapsed() >= Duration::from_millis(10));
    }
}
