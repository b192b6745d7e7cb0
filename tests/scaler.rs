//! End-to-end scenarios for the adaptive scaler
//!
//! Each scenario drives `run_once` directly with a mocked clock and
//! scripted collaborators, advancing the clock one tick interval between
//! passes the way the production worker would.

use std::sync::Arc;
use std::time::Duration;

use taskline::clock::MockTimeSource;
use taskline::config::scaler::{
    KEY_AGGREGATE_ACROSS_PARTITIONS, KEY_DOWNSCALE_SUSTAINED_DURATION,
    KEY_ENABLE_TASKLIST_ISOLATION, KEY_PARTITION_DOWNSCALE_FACTOR, KEY_PARTITION_UPSCALE_RPS,
    KEY_UPSCALE_SUSTAINED_DURATION,
};
use taskline::config::{DynamicConfig, ScalerTunables};
use taskline::observability::ScalerMetrics;
use taskline::tasklist::{
    AdaptiveScaler, DescribeResponse, InMemoryRemoteClient, InMemoryTaskListManager,
    IsolationGroupMetrics, PartitionConfig, TaskListId, TaskListManager, TaskType,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    scaler: Arc<AdaptiveScaler>,
    manager: Arc<InMemoryTaskListManager>,
    remote: Arc<InMemoryRemoteClient>,
    config: Arc<DynamicConfig>,
    clock: Arc<MockTimeSource>,
}

/// Build a scaler wired to scripted collaborators with 1s sustain windows
fn setup() -> Harness {
    let config = Arc::new(DynamicConfig::new());
    config.update_int(KEY_PARTITION_UPSCALE_RPS, 200);
    config.update_float(KEY_PARTITION_DOWNSCALE_FACTOR, 0.75);
    config.update_duration(KEY_UPSCALE_SUSTAINED_DURATION, Duration::from_secs(1));
    config.update_duration(KEY_DOWNSCALE_SUSTAINED_DURATION, Duration::from_secs(1));

    let manager = Arc::new(InMemoryTaskListManager::new());
    let remote = Arc::new(InMemoryRemoteClient::new());
    let clock = Arc::new(MockTimeSource::default());
    let id = TaskListId::new("test-domain-id", "test-task-list", TaskType::Decision).unwrap();
    let scaler = Arc::new(AdaptiveScaler::new(
        id,
        manager.clone(),
        ScalerTunables::new(config.clone()),
        clock.clone(),
        remote.clone(),
        Arc::new(ScalerMetrics::new()),
    ));

    Harness {
        scaler,
        manager,
        remote,
        config,
        clock,
    }
}

impl Harness {
    /// One evaluation pass followed by a full tick interval plus a hair
    async fn tick(&self) {
        self.scaler.run_once().await;
        self.clock
            .advance(Duration::from_secs(1) + Duration::from_millis(1));
    }

    fn partition_name(&self, k: usize) -> String {
        format!("test-task-list/__{}", k)
    }

    /// Script a remote partition reporting only a backlog hint
    fn script_backlog(&self, partition: usize, backlog: i64) {
        self.remote.enqueue_response(
            self.partition_name(partition),
            DescribeResponse::with_qps_and_backlog(0.0, backlog),
        );
    }

    /// Script a remote partition reporting only a QPS observation
    fn script_qps(&self, partition: usize, qps: f64) {
        self.remote
            .enqueue_response(self.partition_name(partition), DescribeResponse::with_qps(qps));
    }
}

fn config_of(read: usize, write: usize) -> PartitionConfig {
    PartitionConfig::with_partitions(read, write)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_overload_upscales_after_sustain() {
    let h = setup();
    // Never configured: treated as one read and one write partition
    h.manager.enqueue_describe(DescribeResponse::with_qps(300.0));

    h.tick().await;
    assert!(h.manager.updates().is_empty(), "first tick only pends");

    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(2, 2)]);
}

#[tokio::test]
async fn flapping_overload_never_commits() {
    let h = setup();
    for qps in [300.0, 100.0, 300.0, 100.0] {
        h.manager.enqueue_describe(DescribeResponse::with_qps(qps));
    }

    for _ in 0..4 {
        h.tick().await;
    }

    assert!(h.manager.updates().is_empty());
    assert!(h.remote.requests().is_empty());
}

#[tokio::test]
async fn anti_flap_band_holds_then_downscales_below_band() {
    let h = setup();
    h.manager.set_partition_config(Some(config_of(2, 2)));
    for qps in [210.0, 210.0, 190.0, 190.0] {
        h.manager.enqueue_describe(DescribeResponse::with_qps(qps));
    }

    // 210 on two partitions sits inside the band: no move either way
    h.tick().await;
    h.tick().await;
    assert!(h.manager.updates().is_empty());

    // 190 < 200 * 0.75 * 2: write shrink pends, then commits
    h.tick().await;
    assert!(h.manager.updates().is_empty());
    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(2, 1)]);
}

#[tokio::test]
async fn idle_tasklist_drains_then_shrinks_reads() {
    let h = setup();
    h.manager.set_partition_config(Some(config_of(10, 10)));
    h.manager.enqueue_describe(DescribeResponse::with_qps(0.0));

    // Tick 1 pends the write shrink, tick 2 commits it
    h.tick().await;
    assert!(h.manager.updates().is_empty());
    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(10, 1)]);

    // Tick 3: every retired partition reports empty, reads collapse
    for partition in 1..10 {
        h.script_backlog(partition, 0);
    }
    h.tick().await;
    assert_eq!(
        h.manager.updates(),
        vec![config_of(10, 1), config_of(1, 1)]
    );
    assert_eq!(
        h.manager.task_list_partition_config(),
        Some(config_of(1, 1))
    );
}

#[tokio::test]
async fn backlogged_partition_blocks_read_shrink() {
    let h = setup();
    h.manager.set_partition_config(Some(config_of(10, 10)));
    h.manager.enqueue_describe(DescribeResponse::with_qps(0.0));

    h.tick().await;
    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(10, 1)]);

    // Partition 4 still holds one task: no read shrink at all
    for partition in 1..10 {
        h.script_backlog(partition, if partition == 4 { 1 } else { 0 });
    }
    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(10, 1)]);
    assert_eq!(
        h.manager.task_list_partition_config(),
        Some(config_of(10, 1))
    );
}

#[tokio::test]
async fn failed_drain_describe_blocks_read_shrink() {
    let h = setup();
    h.manager.set_partition_config(Some(config_of(3, 1)));
    h.manager.enqueue_describe(DescribeResponse::with_qps(0.0));

    h.script_backlog(1, 0);
    h.remote
        .enqueue_error("test-task-list/__2", "deadline exceeded");
    h.tick().await;
    assert!(h.manager.updates().is_empty());

    // Once the partition is observable again the shrink goes through
    h.script_backlog(1, 0);
    h.script_backlog(2, 0);
    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(1, 1)]);
}

#[tokio::test]
async fn isolation_aggregates_partitions_for_upscale() {
    let h = setup();
    h.config.update_bool(KEY_ENABLE_TASKLIST_ISOLATION, true);
    h.manager.set_partition_config(Some(config_of(2, 2)));
    h.manager.enqueue_describe(DescribeResponse::with_qps(1.0));

    // 1 + 400 = 401 across the partitions: three partitions needed
    h.script_qps(1, 400.0);
    h.tick().await;
    assert!(h.manager.updates().is_empty());

    h.script_qps(1, 400.0);
    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(3, 3)]);
}

#[tokio::test]
async fn isolation_aggregates_partitions_for_downscale() {
    let h = setup();
    h.config.update_bool(KEY_ENABLE_TASKLIST_ISOLATION, true);
    h.manager.set_partition_config(Some(config_of(3, 3)));
    h.manager.enqueue_describe(DescribeResponse::with_qps(200.0));

    // 200 + 49 + 50 = 299 < 450: two partitions still suffice
    h.script_qps(1, 49.0);
    h.script_qps(2, 50.0);
    h.tick().await;
    assert!(h.manager.updates().is_empty());

    h.script_qps(1, 49.0);
    h.script_qps(2, 50.0);
    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(3, 2)]);

    // Partition 2 drains immediately; reads follow in the observing tick
    h.script_qps(1, 99.0);
    h.script_backlog(2, 0);
    h.tick().await;
    assert_eq!(
        h.manager.updates(),
        vec![config_of(3, 2), config_of(2, 2)]
    );
}

#[tokio::test]
async fn isolation_hot_group_drives_upscale() {
    let h = setup();
    h.config.update_bool(KEY_ENABLE_TASKLIST_ISOLATION, true);
    h.manager.set_partition_config(Some(config_of(2, 2)));

    // The overall estimators lag, but the group metrics alone show zone-a
    // needing three partitions
    let mut local = DescribeResponse::with_qps(1.0);
    local.status.isolation_group_metrics.insert(
        "zone-a".into(),
        IsolationGroupMetrics {
            new_tasks_per_second: 201.0,
        },
    );
    h.manager.enqueue_describe(local);

    for _ in 0..2 {
        let mut remote = DescribeResponse::with_qps(0.0);
        remote.status.isolation_group_metrics.insert(
            "zone-a".into(),
            IsolationGroupMetrics {
                new_tasks_per_second: 200.0,
            },
        );
        h.remote.enqueue_response(h.partition_name(1), remote);
    }

    h.tick().await;
    h.tick().await;
    // zone-a carries 401: ceil(401/200) = 3 partitions
    assert_eq!(h.manager.updates(), vec![config_of(3, 3)]);
}

#[tokio::test]
async fn describe_error_resets_gate_under_isolation() {
    let h = setup();
    h.config.update_bool(KEY_ENABLE_TASKLIST_ISOLATION, true);
    h.manager.set_partition_config(Some(config_of(3, 3)));

    // Tick 1: partition 2 unreachable; the tick decides nothing
    h.script_qps(1, 0.0);
    h.remote
        .enqueue_error("test-task-list/__2", "deadline exceeded");
    h.tick().await;
    assert!(h.manager.updates().is_empty());
    assert_eq!(h.scaler.metrics().snapshot().observation_errors, 1);

    // Tick 2: clean observations start the downscale window from scratch
    h.script_qps(1, 0.0);
    h.script_qps(2, 0.0);
    h.tick().await;
    assert!(h.manager.updates().is_empty());

    // Tick 3: sustained, commit
    h.script_qps(1, 0.0);
    h.script_qps(2, 0.0);
    h.tick().await;
    assert_eq!(h.manager.updates(), vec![config_of(3, 1)]);
}

#[tokio::test]
async fn summed_aggregation_spans_partitions_without_isolation() {
    let h = setup();
    h.config.update_bool(KEY_AGGREGATE_ACROSS_PARTITIONS, true);
    h.manager.set_partition_config(Some(config_of(2, 2)));
    h.manager.enqueue_describe(DescribeResponse::with_qps(200.0));

    h.script_qps(1, 201.0);
    h.tick().await;
    h.script_qps(1, 201.0);
    h.tick().await;

    // 200 + 201 = 401: three partitions
    assert_eq!(h.manager.updates(), vec![config_of(3, 3)]);
}

#[tokio::test]
async fn applying_current_config_is_noop() {
    let h = setup();
    h.manager.set_partition_config(Some(config_of(2, 2)));
    // ceil(350/200) = 2 == current: nothing to do, nothing pends
    h.manager.enqueue_describe(DescribeResponse::with_qps(350.0));

    for _ in 0..3 {
        h.tick().await;
    }
    assert!(h.manager.updates().is_empty());
}

#[tokio::test]
async fn lifecycle_is_idempotent_and_leak_free() {
    let h = setup();

    h.scaler.start();
    h.scaler.start();
    h.scaler.stop().await;
    h.scaler.stop().await;

    // A stopped scaler never restarts
    h.scaler.start();
    h.scaler.stop().await;
    assert!(h.manager.updates().is_empty());
}
