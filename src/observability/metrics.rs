//! Scaler metrics — lightweight counters and gauges
//!
//! In-process metrics for the adaptive scaler. Counters are fire-and-forget
//! atomics; a snapshot can be exported as JSON by whatever surface the
//! embedding service exposes.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Point-in-time view of the scaler metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerMetricsSnapshot {
    /// Evaluation passes executed
    pub ticks: u64,
    /// Committed upscale decisions
    pub upscales: u64,
    /// Committed write-partition downscales
    pub write_downscales: u64,
    /// Committed read-partition downscales
    pub read_downscales: u64,
    /// Partition describe failures
    pub observation_errors: u64,
    /// Partition-config update failures
    pub commit_errors: u64,
    /// Read partitions after the last committed decision
    pub read_partitions: i64,
    /// Write partitions after the last committed decision
    pub write_partitions: i64,
}

/// Metrics collector for one adaptive scaler
#[derive(Debug, Default)]
pub struct ScalerMetrics {
    ticks: AtomicU64,
    upscales: AtomicU64,
    write_downscales: AtomicU64,
    read_downscales: AtomicU64,
    observation_errors: AtomicU64,
    commit_errors: AtomicU64,
    read_partitions: AtomicI64,
    write_partitions: AtomicI64,
}

impl ScalerMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one evaluation pass
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed upscale
    pub fn record_upscale(&self) {
        self.upscales.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed write-partition downscale
    pub fn record_write_downscale(&self) {
        self.write_downscales.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed read-partition downscale
    pub fn record_read_downscale(&self) {
        self.read_downscales.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed partition describe
    pub fn record_observation_error(&self) {
        self.observation_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed partition-config update
    pub fn record_commit_error(&self) {
        self.commit_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the partition counts after a committed decision
    pub fn set_partitions(&self, read: usize, write: usize) {
        self.read_partitions.store(read as i64, Ordering::Relaxed);
        self.write_partitions.store(write as i64, Ordering::Relaxed);
    }

    /// Ticks executed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Observation errors so far
    pub fn observation_errors(&self) -> u64 {
        self.observation_errors.load(Ordering::Relaxed)
    }

    /// Take a snapshot of all metrics
    pub fn snapshot(&self) -> ScalerMetricsSnapshot {
        ScalerMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            upscales: self.upscales.load(Ordering::Relaxed),
            write_downscales: self.write_downscales.load(Ordering::Relaxed),
            read_downscales: self.read_downscales.load(Ordering::Relaxed),
            observation_errors: self.observation_errors.load(Ordering::Relaxed),
            commit_errors: self.commit_errors.load(Ordering::Relaxed),
            read_partitions: self.read_partitions.load(Ordering::Relaxed),
            write_partitions: self.write_partitions.load(Ordering::Relaxed),
        }
    }
}
