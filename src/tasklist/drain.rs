//! Drain coordination — safe removal of retired write partitions
//!
//! After a write downscale lands, partitions `[W..R-1]` stop receiving new
//! work but stay in the read set until their backlogs empty. Each tick the
//! scaler describes them; only when every one reports a zero backlog may
//! the read set collapse onto the write set. A partition that still calls
//! itself a writer is tolerated — it just has not observed the config
//! update yet — so only the backlog hint decides.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::tasklist::types::TaskListStatus;

/// Outcome of one tick's drain evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Writes equal reads; nothing is retiring
    NotDraining,
    /// At least one retired partition holds backlog or could not be observed
    Draining,
    /// Every retired partition was observed empty this tick
    Drained,
}

impl fmt::Display for DrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDraining => write!(f, "not-draining"),
            Self::Draining => write!(f, "draining"),
            Self::Drained => write!(f, "drained"),
        }
    }
}

/// Tracks drain progress across ticks
#[derive(Debug, Default)]
pub struct DrainCoordinator {
    last_attempt: Option<Duration>,
}

impl DrainCoordinator {
    /// Create a coordinator with no drain history
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the retired partitions `[write..read-1]` against this
    /// tick's describe snapshot.
    ///
    /// `observed` holds the status of every partition that was successfully
    /// described this tick, keyed by partition index. Unobserved retired
    /// partitions count as not drained.
    pub fn evaluate(
        &mut self,
        now: Duration,
        read: usize,
        write: usize,
        observed: &HashMap<usize, TaskListStatus>,
    ) -> DrainStatus {
        if write >= read {
            return DrainStatus::NotDraining;
        }
        self.last_attempt = Some(now);

        for partition in write..read {
            match observed.get(&partition) {
                Some(status) if status.backlog_count_hint == 0 => {}
                _ => return DrainStatus::Draining,
            }
        }
        DrainStatus::Drained
    }

    /// When the coordinator last evaluated an in-flight drain
    pub fn last_attempt(&self) -> Option<Duration> {
        self.last_attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Duration = Duration::from_secs(1000);

    fn status(backlog: i64) -> TaskListStatus {
        TaskListStatus {
            backlog_count_hint: backlog,
            ..TaskListStatus::default()
        }
    }

    fn observed(entries: &[(usize, i64)]) -> HashMap<usize, TaskListStatus> {
        entries.iter().map(|&(p, b)| (p, status(b))).collect()
    }

    #[test]
    fn test_not_draining_when_writes_equal_reads() {
        let mut drain = DrainCoordinator::new();
        assert_eq!(
            drain.evaluate(NOW, 3, 3, &HashMap::new()),
            DrainStatus::NotDraining
        );
        assert_eq!(drain.last_attempt(), None);
    }

    #[test]
    fn test_all_empty_is_drained() {
        let mut drain = DrainCoordinator::new();
        let snapshot = observed(&[(1, 0), (2, 0)]);
        assert_eq!(drain.evaluate(NOW, 3, 1, &snapshot), DrainStatus::Drained);
    }

    #[test]
    fn test_backlog_blocks_drain() {
        let mut drain = DrainCoordinator::new();
        let snapshot = observed(&[(1, 0), (2, 5)]);
        assert_eq!(drain.evaluate(NOW, 3, 1, &snapshot), DrainStatus::Draining);
    }

    #[test]
    fn test_unobserved_partition_blocks_drain() {
        let mut drain = DrainCoordinator::new();
        let snapshot = observed(&[(1, 0)]);
        assert_eq!(drain.evaluate(NOW, 3, 1, &snapshot), DrainStatus::Draining);
    }

    #[test]
    fn test_only_retired_partitions_considered() {
        let mut drain = DrainCoordinator::new();
        // Partition 1 is still a writer; its backlog is irrelevant
        let snapshot = observed(&[(1, 99), (2, 0)]);
        assert_eq!(drain.evaluate(NOW, 3, 2, &snapshot), DrainStatus::Drained);
    }

    #[test]
    fn test_last_attempt_recorded() {
        let mut drain = DrainCoordinator::new();
        let snapshot = observed(&[(1, 1)]);
        drain.evaluate(NOW, 2, 1, &snapshot);
        assert_eq!(drain.last_attempt(), Some(NOW));

        let later = NOW + Duration::from_secs(5);
        drain.evaluate(later, 2, 1, &snapshot);
        assert_eq!(drain.last_attempt(), Some(later));
    }

    #[test]
    fn test_drain_status_display() {
        assert_eq!(DrainStatus::NotDraining.to_string(), "not-draining");
        assert_eq!(DrainStatus::Draining.to_string(), "draining");
        assert_eq!(DrainStatus::Drained.to_string(), "drained");
    }
}
