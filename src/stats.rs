//! Statistics for the cache façade.
//!
//! This module provides atomic counters for tracking cache-aside traffic,
//! shared by a [`Cache`](crate::Cache) and every pipeline created from it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for cache operations.
///
/// All counters are atomic and can be safely accessed from multiple tasks.
/// Use `Cache::stats()` to get a snapshot of the current statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Reads that found a value.
    hits: AtomicU64,

    /// Reads that found nothing.
    misses: AtomicU64,

    /// Producer invocations after a miss.
    computes: AtomicU64,

    /// Write operations issued, or queued on a pipeline (set, hset, sadd,
    /// hincrby). Write-backs after a miss count too.
    writes: AtomicU64,

    /// Key and field deletions in batches the store accepted.
    deletes: AtomicU64,

    /// Atomic batches submitted to the store.
    batches: AtomicU64,

    /// Write-backs after a miss that failed.
    populate_failures: AtomicU64,
}

impl CacheStats {
    /// Create a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_compute(&self) {
        self.computes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_populate_failure(&self) {
        self.populate_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Getters for reading statistics

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn computes(&self) -> u64 {
        self.computes.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    pub fn populate_failures(&self) -> u64 {
        self.populate_failures.load(Ordering::Relaxed)
    }

    /// Calculate the hit rate as a percentage (0.0 to 100.0).
    /// Returns 0.0 if no reads have been performed.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            computes: self.computes(),
            writes: self.writes(),
            deletes: self.deletes(),
            batches: self.batches(),
            populate_failures: self.populate_failures(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// A point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub computes: u64,
    pub writes: u64,
    pub deletes: u64,
    pub batches: u64,
    pub populate_failures: u64,
    pub hit_rate: f64,
}
