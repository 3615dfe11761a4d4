//! Translation loading metrics.
//!
//! Counts cache hits and misses and translation file loads so the admin
//! stats endpoint can report how well the cache is doing.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Namespace served from the translation cache
    cache_hits: AtomicUsize,

    /// Namespace not in cache (absent or expired)
    cache_misses: AtomicUsize,

    /// Translation files loaded from a source
    loads: AtomicUsize,

    /// Translation file loads that failed
    load_failures: AtomicUsize,
}

static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide metrics instance.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(TranslationMetrics::new)
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn load_failures(&self) -> usize {
        self.load_failures.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        let loads = self.loads();
        let failures = self.load_failures();
        let load_success_rate = if loads > 0 {
            (loads.saturating_sub(failures) as f64 / loads as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            loads,
            load_failures: failures,
            load_success_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,
    pub loads: usize,
    pub load_failures: usize,
    /// Load success rate as a percentage (0-100)
    pub load_success_rate: f64,
}
