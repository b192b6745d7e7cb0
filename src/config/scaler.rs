//! Scaler tunables — dynamic-config bindings for the adaptive scaler
//!
//! Every getter resolves its key against the shared [`DynamicConfig`] at
//! call time; nothing is cached across ticks.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::DynamicConfig;

/// Master switch for the adaptive scaler loop
pub const KEY_ENABLE_ADAPTIVE_SCALER: &str = "matching.enableAdaptiveScaler";
/// Per-partition QPS target above which write partitions are added
pub const KEY_PARTITION_UPSCALE_RPS: &str = "matching.partitionUpscaleRPS";
/// Fraction of the upscale threshold below which write partitions are removed
pub const KEY_PARTITION_DOWNSCALE_FACTOR: &str = "matching.partitionDownscaleFactor";
/// How long an upscale decision must hold before it is committed
pub const KEY_UPSCALE_SUSTAINED_DURATION: &str = "matching.partitionUpscaleSustainedDuration";
/// How long a downscale decision must hold before it is committed
pub const KEY_DOWNSCALE_SUSTAINED_DURATION: &str = "matching.partitionDownscaleSustainedDuration";
/// Hard ceiling on partition count
pub const KEY_MAX_PARTITIONS: &str = "matching.maxTaskListPartitions";
/// Interval between scaler ticks
pub const KEY_PARTITION_UPDATE_INTERVAL: &str = "matching.partitionUpdateInterval";
/// Whether producer traffic is isolated by group key
pub const KEY_ENABLE_TASKLIST_ISOLATION: &str = "matching.enableTasklistIsolation";
/// Whether non-isolated aggregation sums QPS across partitions instead of
/// trusting partition 0's self-report
pub const KEY_AGGREGATE_ACROSS_PARTITIONS: &str = "matching.aggregateAcrossPartitions";

const DEFAULT_UPSCALE_RPS: f64 = 200.0;
const DEFAULT_DOWNSCALE_FACTOR: f64 = 0.75;
const DEFAULT_UPSCALE_SUSTAINED: Duration = Duration::from_secs(60);
const DEFAULT_DOWNSCALE_SUSTAINED: Duration = Duration::from_secs(120);
const DEFAULT_MAX_PARTITIONS: i64 = 100;
const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// Scaler tunables bound to a dynamic-config store
#[derive(Debug, Clone)]
pub struct ScalerTunables {
    config: Arc<DynamicConfig>,
}

/// A per-tick snapshot of every tunable the scaler consumes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTunables {
    pub enabled: bool,
    pub upscale_rps: f64,
    pub downscale_factor: f64,
    pub upscale_sustained: Duration,
    pub downscale_sustained: Duration,
    pub max_partitions: usize,
    pub update_interval: Duration,
    pub isolation_enabled: bool,
    pub aggregate_across_partitions: bool,
}

impl ScalerTunables {
    /// Bind the scaler's keys to a dynamic-config store
    pub fn new(config: Arc<DynamicConfig>) -> Self {
        Self { config }
    }

    /// Whether the scaler acts at all this tick
    pub fn enabled(&self) -> bool {
        self.config.get_bool(KEY_ENABLE_ADAPTIVE_SCALER, true)
    }

    /// Per-partition QPS target
    pub fn upscale_rps(&self) -> f64 {
        let rps = self
            .config
            .get_float(KEY_PARTITION_UPSCALE_RPS, DEFAULT_UPSCALE_RPS);
        if rps > 0.0 {
            rps
        } else {
            DEFAULT_UPSCALE_RPS
        }
    }

    /// Anti-flap band factor, held to (0, 1]
    pub fn downscale_factor(&self) -> f64 {
        let factor = self
            .config
            .get_float(KEY_PARTITION_DOWNSCALE_FACTOR, DEFAULT_DOWNSCALE_FACTOR);
        if factor > 0.0 && factor <= 1.0 {
            factor
        } else {
            DEFAULT_DOWNSCALE_FACTOR
        }
    }

    /// Sustain window for upscale decisions
    pub fn upscale_sustained_duration(&self) -> Duration {
        self.config
            .get_duration(KEY_UPSCALE_SUSTAINED_DURATION, DEFAULT_UPSCALE_SUSTAINED)
    }

    /// Sustain window for write-downscale decisions
    pub fn downscale_sustained_duration(&self) -> Duration {
        self.config
            .get_duration(KEY_DOWNSCALE_SUSTAINED_DURATION, DEFAULT_DOWNSCALE_SUSTAINED)
    }

    /// Hard ceiling on partition count
    pub fn max_partitions(&self) -> usize {
        self.config
            .get_int(KEY_MAX_PARTITIONS, DEFAULT_MAX_PARTITIONS)
            .max(1) as usize
    }

    /// Interval between scaler ticks
    pub fn partition_update_interval(&self) -> Duration {
        let interval = self
            .config
            .get_duration(KEY_PARTITION_UPDATE_INTERVAL, DEFAULT_UPDATE_INTERVAL);
        if interval.is_zero() {
            DEFAULT_UPDATE_INTERVAL
        } else {
            interval
        }
    }

    /// Whether producer traffic is isolated by group key
    pub fn isolation_enabled(&self) -> bool {
        self.config.get_bool(KEY_ENABLE_TASKLIST_ISOLATION, false)
    }

    /// Whether non-isolated aggregation sums across partitions
    pub fn aggregate_across_partitions(&self) -> bool {
        self.config.get_bool(KEY_AGGREGATE_ACROSS_PARTITIONS, false)
    }

    /// Resolve every tunable once, for one tick
    pub fn resolve(&self) -> ResolvedTunables {
        ResolvedTunables {
            enabled: self.enabled(),
            upscale_rps: self.upscale_rps(),
            downscale_factor: self.downscale_factor(),
            upscale_sustained: self.upscale_sustained_duration(),
            downscale_sustained: self.downscale_sustained_duration(),
            max_partitions: self.max_partitions(),
            update_interval: self.partition_update_interval(),
            isolation_enabled: self.isolation_enabled(),
            aggregate_across_partitions: self.aggregate_across_partitions(),
        }
    }
}
