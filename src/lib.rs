//! # Taskline Matching
//!
//! The task-list (work queue) subsystem of the Taskline workflow
//! orchestration cluster, reduced to its partition-scaling core: value
//! types for task-list partitions, the collaborator contracts the scaler
//! consumes, and the adaptive scaler itself.
//!
//! ## Architecture
//!
//! ```text
//! Scaler tick:  Manager.config → local + remote describes → aggregate
//!               → Policy Engine → Sustain Gate → Manager.update
//! ```
//!
//! Expansion reacts to sustained overload; contraction retires write
//! partitions first and collapses the read set only after every retired
//! partition reports an empty backlog.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskline::clock::SystemTimeSource;
//! use taskline::config::{DynamicConfig, ScalerTunables};
//! use taskline::observability::ScalerMetrics;
//! use taskline::{AdaptiveScaler, TaskListId, TaskType};
//!
//! let id = TaskListId::new("domain-id", "orders", TaskType::Decision)?;
//! let tunables = ScalerTunables::new(Arc::new(DynamicConfig::new()));
//! let scaler = Arc::new(AdaptiveScaler::new(
//!     id, manager, tunables,
//!     Arc::new(SystemTimeSource),
//!     remote_client,
//!     Arc::new(ScalerMetrics::new()),
//! ));
//! scaler.start();
//! // ...
//! scaler.stop().await;
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod observability;
pub mod stats;
pub mod tasklist;

// Re-export main types
pub use error::{MatchingError, Result};
pub use tasklist::{
    AdaptiveScaler, Decision, DescribeResponse, PartitionConfig, RemoteMatchingClient,
    ScalerStatus, TaskListId, TaskListManager, TaskType,
};
