//! Task-list manager contract — the scaler's local view of partition 0
//!
//! The real manager lives with the partition host and owns task storage,
//! polling, and persistence of the partition config. The scaler consumes
//! only the three operations below. `InMemoryTaskListManager` is a scripted
//! implementation for tests and local harnesses.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{MatchingError, Result};
use crate::tasklist::types::{DescribeResponse, PartitionConfig};

/// Local manager of a task list's partition 0
#[async_trait]
pub trait TaskListManager: Send + Sync {
    /// Describe the local partition. Synchronous and infallible.
    fn describe_task_list(&self, include_status: bool) -> DescribeResponse;

    /// The currently persisted partition config, or `None` when the task
    /// list has never been configured (callers treat that as one read and
    /// one write partition).
    fn task_list_partition_config(&self) -> Option<PartitionConfig>;

    /// Persist a new partition config. Idempotent full replacement; on
    /// success the config is eventually visible to all partitions.
    async fn update_task_list_partition_config(&self, config: PartitionConfig) -> Result<()>;
}

/// Scripted in-memory manager.
///
/// Describe responses are served from a queue (the last one repeats once
/// the queue drains); updates are recorded and applied to the stored
/// config. A failure can be injected for the next update call.
#[derive(Debug, Default)]
pub struct InMemoryTaskListManager {
    partition_config: Mutex<Option<PartitionConfig>>,
    describes: Mutex<VecDeque<DescribeResponse>>,
    updates: Mutex<Vec<PartitionConfig>>,
    fail_next_update: Mutex<Option<String>>,
}

impl InMemoryTaskListManager {
    /// Create a manager with no stored config and no scripted describes
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with an initial stored config
    pub fn with_config(config: PartitionConfig) -> Self {
        let manager = Self::new();
        manager.set_partition_config(Some(config));
        manager
    }

    /// Replace the stored partition config
    pub fn set_partition_config(&self, config: Option<PartitionConfig>) {
        *self.partition_config.lock().unwrap() = config;
    }

    /// Queue a describe response
    pub fn enqueue_describe(&self, response: DescribeResponse) {
        self.describes.lock().unwrap().push_back(response);
    }

    /// All configs passed to update, in order
    pub fn updates(&self) -> Vec<PartitionConfig> {
        self.updates.lock().unwrap().clone()
    }

    /// Make the next update call fail with the given reason
    pub fn fail_next_update(&self, reason: impl Into<String>) {
        *self.fail_next_update.lock().unwrap() = Some(reason.into());
    }
}

#[async_trait]
impl TaskListManager for InMemoryTaskListManager {
    fn describe_task_list(&self, _include_status: bool) -> DescribeResponse {
        let mut describes = self.describes.lock().unwrap();
        if describes.len() > 1 {
            describes.pop_front().unwrap()
        } else {
            describes.front().cloned().unwrap_or_default()
        }
    }

    fn task_list_partition_config(&self) -> Option<PartitionConfig> {
        self.partition_config.lock().unwrap().clone()
    }

    async fn update_task_list_partition_config(&self, config: PartitionConfig) -> Result<()> {
        if let Some(reason) = self.fail_next_update.lock().unwrap().take() {
            return Err(MatchingError::Commit(reason));
        }
        self.updates.lock().unwrap().push(config.clone());
        *self.partition_config.lock().unwrap() = Some(config);
        Ok(())
    }
}
