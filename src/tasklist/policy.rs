//! Policy engine — pure scaling decisions from aggregated load
//!
//! Desired write capacity follows `ceil(qps / upscale_rps)`, clamped to
//! `[1, max_partitions]`. Expansion fires as soon as the desired count
//! exceeds the current writes; contraction additionally requires load to
//! fall below `write × upscale_rps × downscale_factor`, so observed QPS
//! sitting between the two thresholds never proposes a decrease.

use serde::Serialize;
use std::fmt;

use crate::config::ResolvedTunables;
use crate::tasklist::drain::DrainStatus;
use crate::tasklist::types::{AggregatedLoad, PartitionConfig};

/// A scaling decision over the partition sets.
///
/// Variants carry their full target so an invalid combination (for
/// example a read shrink that lands above the current reads) cannot be
/// represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Decision {
    /// Leave the config untouched
    NoOp,
    /// Grow write capacity; reads grow with writes but never shrink
    Upscale { read: usize, write: usize },
    /// Retire write partitions, keeping them readable while they drain
    DownscaleWrite { read: usize, write: usize },
    /// Collapse reads onto the write set once every retired partition is empty
    DownscaleRead { partitions: usize },
}

impl Decision {
    /// Whether this decision changes nothing
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// Stable label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Upscale { .. } => "upscale",
            Self::DownscaleWrite { .. } => "downscale-write",
            Self::DownscaleRead { .. } => "downscale-read",
        }
    }

    /// Materialize the decision as a full partition config
    pub fn to_partition_config(&self) -> Option<PartitionConfig> {
        match *self {
            Self::NoOp => None,
            Self::Upscale { read, write } | Self::DownscaleWrite { read, write } => {
                Some(PartitionConfig::with_partitions(read, write))
            }
            Self::DownscaleRead { partitions } => {
                Some(PartitionConfig::with_partitions(partitions, partitions))
            }
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoOp => write!(f, "no-op"),
            Self::Upscale { read, write } => write!(f, "upscale(read={}, write={})", read, write),
            Self::DownscaleWrite { read, write } => {
                write!(f, "downscale-write(read={}, write={})", read, write)
            }
            Self::DownscaleRead { partitions } => {
                write!(f, "downscale-read(partitions={})", partitions)
            }
        }
    }
}

/// Compute the decision for one tick.
///
/// Priorities: expansion beats any contraction, and finishing an in-flight
/// drain beats starting a new one.
pub fn decide(
    read: usize,
    write: usize,
    load: &AggregatedLoad,
    drain: DrainStatus,
    tunables: &ResolvedTunables,
) -> Decision {
    let read = read.max(1);
    let write = write.clamp(1, read);

    let mut desired = partitions_for(load.total_qps, tunables.upscale_rps);
    if tunables.isolation_enabled {
        // A single hot group must not be starved behind cold ones
        let group_desired = load
            .per_group_qps
            .values()
            .map(|&qps| partitions_for(qps, tunables.upscale_rps))
            .max()
            .unwrap_or(0);
        desired = desired.max(group_desired);
    }

    if desired > write {
        let clamped = desired.min(tunables.max_partitions);
        if clamped > write {
            return Decision::Upscale {
                read: read.max(clamped),
                write: clamped,
            };
        }
    }

    if drain == DrainStatus::Drained && write < read {
        return Decision::DownscaleRead { partitions: write };
    }

    if write > 1 {
        let lower_band = tunables.upscale_rps * tunables.downscale_factor * write as f64;
        if load.total_qps < lower_band {
            let target = desired.max(1);
            if target < write {
                return Decision::DownscaleWrite {
                    read,
                    write: target,
                };
            }
        }
    }

    Decision::NoOp
}

/// Write partitions needed to keep each at or under `upscale_rps`
fn partitions_for(qps: f64, upscale_rps: f64) -> usize {
    if qps <= 0.0 {
        return 0;
    }
    (qps / upscale_rps).ceil() as usize
}
