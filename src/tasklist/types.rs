//! Wire-level types at the scaler's boundary
//!
//! These mirror the shapes carried by the matching transport: partition
//! sets are maps keyed by partition index so new per-partition fields can
//! be added without a wire break.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{MatchingError, Result};

/// Per-partition settings. Currently empty; a placeholder on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListPartition {}

/// The partition sets of a task list.
///
/// Invariants: both sets are contiguous prefixes `{0..n-1}`, writes are a
/// subset of reads, and neither set is empty. [`validate`](Self::validate)
/// checks all three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Partitions eligible for polling
    pub read_partitions: BTreeMap<usize, TaskListPartition>,
    /// Partitions eligible for dispatch
    pub write_partitions: BTreeMap<usize, TaskListPartition>,
}

impl PartitionConfig {
    /// Build a config with contiguous read/write prefixes of the given sizes
    pub fn with_partitions(read: usize, write: usize) -> Self {
        Self {
            read_partitions: (0..read).map(|i| (i, TaskListPartition::default())).collect(),
            write_partitions: (0..write).map(|i| (i, TaskListPartition::default())).collect(),
        }
    }

    /// Number of read partitions
    pub fn read_count(&self) -> usize {
        self.read_partitions.len()
    }

    /// Number of write partitions
    pub fn write_count(&self) -> usize {
        self.write_partitions.len()
    }

    /// Check the partition-set invariants
    pub fn validate(&self) -> Result<()> {
        check_contiguous("read", &self.read_partitions)?;
        check_contiguous("write", &self.write_partitions)?;
        if self.write_count() > self.read_count() {
            return Err(MatchingError::Config(format!(
                "write partitions ({}) exceed read partitions ({})",
                self.write_count(),
                self.read_count()
            )));
        }
        Ok(())
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self::with_partitions(1, 1)
    }
}

fn check_contiguous(kind: &str, set: &BTreeMap<usize, TaskListPartition>) -> Result<()> {
    if set.is_empty() {
        return Err(MatchingError::Config(format!(
            "{} partitions must not be empty",
            kind
        )));
    }
    for (expected, &actual) in set.keys().enumerate() {
        if expected != actual {
            return Err(MatchingError::Config(format!(
                "{} partitions are not a contiguous prefix (missing index {})",
                kind, expected
            )));
        }
    }
    Ok(())
}

/// Load metrics reported by a single isolation group on one partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsolationGroupMetrics {
    /// New tasks per second observed for the group
    pub new_tasks_per_second: f64,
}

/// Load status of one partition, as reported by its host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskListStatus {
    /// New tasks per second observed by the partition
    pub new_tasks_per_second: f64,
    /// Tasks enqueued but not yet dispatched
    pub backlog_count_hint: i64,
    /// Per-isolation-group load, present when isolation is enabled
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub isolation_group_metrics: HashMap<String, IsolationGroupMetrics>,
}

/// Response to a task-list describe call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeResponse {
    /// Load status; meaningful when the describe requested it
    pub status: TaskListStatus,
    /// The partition config as the described partition currently sees it.
    /// Informational only: a retired partition may lag behind an update and
    /// still report itself as a writer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_config: Option<PartitionConfig>,
}

impl DescribeResponse {
    /// Build a response carrying only a QPS observation
    pub fn with_qps(qps: f64) -> Self {
        Self {
            status: TaskListStatus {
                new_tasks_per_second: qps,
                ..TaskListStatus::default()
            },
            partition_config: None,
        }
    }

    /// Build a response carrying a QPS observation and a backlog hint
    pub fn with_qps_and_backlog(qps: f64, backlog: i64) -> Self {
        Self {
            status: TaskListStatus {
                new_tasks_per_second: qps,
                backlog_count_hint: backlog,
                ..TaskListStatus::default()
            },
            partition_config: None,
        }
    }
}

/// Load aggregated across partitions for one scaler tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedLoad {
    /// Total new tasks per second
    pub total_qps: f64,
    /// Per-isolation-group totals; empty unless isolation is enabled
    pub per_group_qps: HashMap<String, f64>,
}

impl AggregatedLoad {
    /// Fold one partition's status into the aggregate
    pub fn fold(&mut self, status: &TaskListStatus) {
        self.total_qps += status.new_tasks_per_second;
        for (group, metrics) in &status.isolation_group_metrics {
            *self.per_group_qps.entry(group.clone()).or_insert(0.0) +=
                metrics.new_tasks_per_second;
        }
    }
}
