//! Centralized error types for the taskline matching subsystem

use thiserror::Error;

/// Matching subsystem error types
#[derive(Debug, Error)]
pub enum MatchingError {
    /// Configuration value, identifier, or partition set is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A partition could not be described
    #[error("Failed to describe partition '{partition}': {reason}")]
    Observation { partition: String, reason: String },

    /// Persisting a partition config failed
    #[error("Failed to commit partition config: {0}")]
    Commit(String),

    /// An outbound call exceeded its deadline
    #[error("Remote call timed out after {0}ms")]
    RemoteTimeout(u64),

    /// QPS tracker used after it was stopped
    #[error("QPS tracker is stopped")]
    TrackerStopped,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MatchingError {
    /// Build an observation error for a named partition
    pub fn observation(partition: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Observation {
            partition: partition.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MatchingError>;
