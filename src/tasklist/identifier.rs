//! Task-list identifiers — naming of task lists and their partitions
//!
//! A task list is keyed by (domain, root name, task type). Partition 0 is
//! addressed by the root name itself; partition `k > 0` is addressed by the
//! derived name `{root}/__{k}`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MatchingError, Result};

/// Separator between a root task-list name and a partition index
pub const PARTITION_DELIMITER: &str = "/__";

/// Kind of task a task list carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Workflow decision tasks
    Decision,
    /// Activity tasks
    Activity,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decision => write!(f, "decision"),
            Self::Activity => write!(f, "activity"),
        }
    }
}

/// Identifier of one task-list partition.
///
/// Equality is structural across all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskListId {
    domain_id: String,
    root: String,
    task_type: TaskType,
    partition: usize,
}

impl TaskListId {
    /// Build an identifier from a transport-visible name.
    ///
    /// `name` may be a root name or a derived partition name; the partition
    /// index is parsed from the `/__{k}` suffix. `{root}/__0` is rejected
    /// (partition 0 is always addressed by the root name).
    pub fn new(
        domain_id: impl Into<String>,
        name: impl Into<String>,
        task_type: TaskType,
    ) -> Result<Self> {
        let domain_id = domain_id.into();
        let name = name.into();
        if domain_id.is_empty() {
            return Err(MatchingError::Config("domain id must not be empty".into()));
        }
        if name.is_empty() {
            return Err(MatchingError::Config(
                "task list name must not be empty".into(),
            ));
        }

        let (root, partition) = match name.rfind(PARTITION_DELIMITER) {
            Some(at) => {
                let root = &name[..at];
                let suffix = &name[at + PARTITION_DELIMITER.len()..];
                let partition: usize = suffix.parse().map_err(|_| {
                    MatchingError::Config(format!(
                        "task list name '{}' has a non-numeric partition suffix",
                        name
                    ))
                })?;
                if root.is_empty() {
                    return Err(MatchingError::Config(format!(
                        "task list name '{}' has an empty root",
                        name
                    )));
                }
                if partition == 0 {
                    return Err(MatchingError::Config(format!(
                        "task list name '{}' addresses partition 0 by suffix",
                        name
                    )));
                }
                (root.to_string(), partition)
            }
            None => (name, 0),
        };

        Ok(Self {
            domain_id,
            root,
            task_type,
            partition,
        })
    }

    /// Owning domain id
    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    /// Root task-list name (partition 0's transport name)
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Task type carried by this list
    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// This identifier's partition index
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Whether this identifier addresses partition 0
    pub fn is_root(&self) -> bool {
        self.partition == 0
    }

    /// Transport-visible name of this identifier's partition
    pub fn name(&self) -> String {
        self.partition_name(self.partition)
    }

    /// Transport-visible name of sibling partition `k`
    pub fn partition_name(&self, k: usize) -> String {
        if k == 0 {
            self.root.clone()
        } else {
            format!("{}{}{}", self.root, PARTITION_DELIMITER, k)
        }
    }
}

impl fmt::Display for TaskListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.domain_id, self.name(), self.task_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_name() {
        let id = TaskListId::new("dom", "orders", TaskType::Decision).unwrap();
        assert_eq!(id.root(), "orders");
        assert_eq!(id.partition(), 0);
        assert!(id.is_root());
        assert_eq!(id.name(), "orders");
    }

    #[test]
    fn test_partition_suffix_parsed() {
        let id = TaskListId::new("dom", "orders/__3", TaskType::Activity).unwrap();
        assert_eq!(id.root(), "orders");
        assert_eq!(id.partition(), 3);
        assert!(!id.is_root());
        assert_eq!(id.name(), "orders/__3");
    }

    #[test]
    fn test_partition_name_derivation() {
        let id = TaskListId::new("dom", "orders", TaskType::Decision).unwrap();
        assert_eq!(id.partition_name(0), "orders");
        assert_eq!(id.partition_name(1), "orders/__1");
        assert_eq!(id.partition_name(9), "orders/__9");
    }

    #[test]
    fn test_last_delimiter_wins() {
        // Roots may themselves contain the delimiter
        let id = TaskListId::new("dom", "a/__b/__2", TaskType::Decision).unwrap();
        assert_eq!(id.root(), "a/__b");
        assert_eq!(id.partition(), 2);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(TaskListId::new("dom", "", TaskType::Decision).is_err());
    }

    #[test]
    fn test_empty_domain_rejected() {
        assert!(TaskListId::new("", "orders", TaskType::Decision).is_err());
    }

    #[test]
    fn test_zero_suffix_rejected() {
        let err = TaskListId::new("dom", "orders/__0", TaskType::Decision).unwrap_err();
        assert!(err.to_string().contains("partition 0"));
    }

    #[test]
    fn test_non_numeric_suffix_rejected() {
        let err = TaskListId::new("dom", "orders/__abc", TaskType::Decision).unwrap_err();
        assert!(err.to_string().contains("non-numeric"));
    }

    #[test]
    fn test_empty_root_rejected() {
        assert!(TaskListId::new("dom", "/__2", TaskType::Decision).is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = TaskListId::new("dom", "orders", TaskType::Decision).unwrap();
        let b = TaskListId::new("dom", "orders", TaskType::Decision).unwrap();
        let c = TaskListId::new("dom", "orders", TaskType::Activity).unwrap();
        let d = TaskListId::new("dom", "orders/__1", TaskType::Decision).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let id = TaskListId::new("dom", "orders/__2", TaskType::Activity).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: TaskListId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display() {
        let id = TaskListId::new("dom", "orders/__2", TaskType::Decision).unwrap();
        assert_eq!(id.to_string(), "dom:orders/__2 (decision)");
    }

    #[test]
    fn test_task_type_display() {
        assert_eq!(TaskType::Decision.to_string(), "decision");
        assert_eq!(TaskType::Activity.to_string(), "activity");
    }
}
