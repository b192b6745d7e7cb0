//! Task-list partitioning — identifiers, partition configs, and the
//! adaptive scaler
//!
//! A task list is sharded across a contiguous prefix of partitions;
//! producers target the write set, consumers poll the read set. The
//! adaptive scaler watches per-partition load and adjusts both sets:
//! expansion is quick, contraction goes through a two-phase drain so no
//! enqueued work is ever orphaned.

pub mod drain;
pub mod gate;
pub mod identifier;
pub mod manager;
pub mod policy;
pub mod remote;
pub mod scaler;
pub mod types;

pub use drain::{DrainCoordinator, DrainStatus};
pub use gate::SustainGate;
pub use identifier::{TaskListId, TaskType, PARTITION_DELIMITER};
pub use manager::{InMemoryTaskListManager, TaskListManager};
pub use policy::{decide, Decision};
pub use remote::{DescribeTaskListRequest, InMemoryRemoteClient, RemoteMatchingClient};
pub use scaler::{AdaptiveScaler, ScalerStatus};
pub use types::{
    AggregatedLoad, DescribeResponse, IsolationGroupMetrics, PartitionConfig, TaskListPartition,
    TaskListStatus,
};
