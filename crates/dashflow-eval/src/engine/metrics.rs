//! Lightweight counters for cache behavior

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters collected while a session evaluates.
#[derive(Debug, Default)]
pub struct EvalMetrics {
    // Cache performance
    pub cache_hits: AtomicUsize,
    pub recomputations: AtomicUsize,
    pub failures: AtomicUsize,

    // Invalidation
    pub writes: AtomicUsize,
    pub noop_writes: AtomicUsize,
    pub invalidations: AtomicUsize,

    // Timing
    pub compute_time_ns: AtomicU64,
}

impl EvalMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recompute(&self, duration: Duration) {
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        self.compute_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn inc_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, changed: bool) {
        if changed {
            self.writes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.noop_writes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_invalidations(&self, count: usize) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn recomputations(&self) -> usize {
        self.recomputations.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::Relaxed)
    }

    pub fn total_compute_time(&self) -> Duration {
        Duration::from_nanos(self.compute_time_ns.load(Ordering::Relaxed))
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.recomputations.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.noop_writes.store(0, Ordering::Relaxed);
        self.invalidations.store(0, Ordering::Relaxed);
        self.compute_time_ns.store(0, Ordering::Relaxed);
    }

    pub fn summary(&self) -> String {
        format!(
            "EvalMetrics {{ hits: {}, recomputed: {}, failed: {}, writes: {}/{}, invalidated: {}, compute_ms: {:.1} }}",
            self.cache_hits(),
            self.recomputations(),
            self.failures(),
            self.writes.load(Ordering::Relaxed),
            self.writes.load(Ordering::Relaxed) + self.noop_writes.load(Ordering::Relaxed),
            self.invalidations(),
            self.compute_time_ns.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        )
    }
}

/// Timer helper for measuring a single recomputation
pub struct ComputeTimer {
    start: Instant,
}

impl ComputeTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
