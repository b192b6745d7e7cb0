//! Adaptive scaler — periodic control loop over a task list's partitions
//!
//! Each tick: read the current config, describe the partitions that matter
//! this tick, aggregate load, run the policy engine, filter the candidate
//! through the sustain gate, and commit an admitted decision through the
//! manager. Ticks are serial; a tick still running when the timer fires
//! absorbs the fire.

use futures_util::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::clock::TimeSource;
use crate::config::ScalerTunables;
use crate::error::MatchingError;
use crate::observability::ScalerMetrics;
use crate::tasklist::drain::DrainCoordinator;
use crate::tasklist::gate::SustainGate;
use crate::tasklist::identifier::TaskListId;
use crate::tasklist::manager::TaskListManager;
use crate::tasklist::policy::{self, Decision};
use crate::tasklist::remote::{DescribeTaskListRequest, RemoteMatchingClient};
use crate::tasklist::types::{AggregatedLoad, DescribeResponse, TaskListStatus};

const STATUS_INITIALIZED: u8 = 0;
const STATUS_STARTED: u8 = 1;
const STATUS_STOPPED: u8 = 2;

/// Lifecycle state of a scaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalerStatus {
    /// Created, not yet started
    Initialized,
    /// Worker task running
    Started,
    /// Worker task stopped; terminal
    Stopped,
}

impl fmt::Display for ScalerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized => write!(f, "initialized"),
            Self::Started => write!(f, "started"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Adaptive partition scaler for one task list.
///
/// One scaler runs per task-list owner; the surrounding ownership layer
/// guarantees there is at most one active scaler per list.
pub struct AdaptiveScaler {
    id: TaskListId,
    manager: Arc<dyn TaskListManager>,
    tunables: ScalerTunables,
    time_source: Arc<dyn TimeSource>,
    remote_client: Arc<dyn RemoteMatchingClient>,
    metrics: Arc<ScalerMetrics>,
    status: AtomicU8,
    gate: Mutex<SustainGate>,
    drain: Mutex<DrainCoordinator>,
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl AdaptiveScaler {
    /// Create a scaler; call [`start`](Self::start) to begin ticking
    pub fn new(
        id: TaskListId,
        manager: Arc<dyn TaskListManager>,
        tunables: ScalerTunables,
        time_source: Arc<dyn TimeSource>,
        remote_client: Arc<dyn RemoteMatchingClient>,
        metrics: Arc<ScalerMetrics>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            id,
            manager,
            tunables,
            time_source,
            remote_client,
            metrics,
            status: AtomicU8::new(STATUS_INITIALIZED),
            gate: Mutex::new(SustainGate::new()),
            drain: Mutex::new(DrainCoordinator::new()),
            shutdown,
            handle: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> ScalerStatus {
        match self.status.load(Ordering::Acquire) {
            STATUS_STARTED => ScalerStatus::Started,
            STATUS_STOPPED => ScalerStatus::Stopped,
            _ => ScalerStatus::Initialized,
        }
    }

    /// Metrics collector for this scaler
    pub fn metrics(&self) -> &ScalerMetrics {
        &self.metrics
    }

    /// Start the periodic worker. Idempotent; a second call, or a call
    /// after [`stop`](Self::stop), does nothing.
    pub fn start(self: &Arc<Self>) {
        if self
            .status
            .compare_exchange(
                STATUS_INITIALIZED,
                STATUS_STARTED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        let scaler = Arc::clone(self);
        let mut shutdown_rx = self.shutdown.subscribe();
        let task = tokio::spawn(async move {
            loop {
                // Re-resolved every iteration so interval changes apply
                // without a restart
                let interval = scaler.tunables.partition_update_interval();
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        tokio::select! {
                            _ = scaler.run_once() => {}
                            _ = shutdown_rx.changed() => break,
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });
        *self.handle.lock().unwrap() = Some(task);
        tracing::info!(task_list = %self.id, "Adaptive scaler started");
    }

    /// Stop the worker and wait for it to exit. Idempotent; a call before
    /// [`start`](Self::start) does nothing.
    pub async fn stop(&self) {
        if self
            .status
            .compare_exchange(
                STATUS_STARTED,
                STATUS_STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        let _ = self.shutdown.send(true);
        let task = self.handle.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        tracing::info!(task_list = %self.id, "Adaptive scaler stopped");
    }

    /// Execute a single evaluation pass.
    ///
    /// Driven by the worker in production; tests call it directly and
    /// advance a mock clock between calls.
    pub async fn run_once(&self) {
        let tunables = self.tunables.resolve();
        if !tunables.enabled {
            return;
        }
        self.metrics.record_tick();
        let now = self.time_source.now();

        // Read the config once and hold it for the whole tick
        let (read, write) = match self.manager.task_list_partition_config() {
            Some(config) => match config.validate() {
                Ok(()) => (config.read_count(), config.write_count()),
                Err(err) => {
                    tracing::warn!(
                        task_list = %self.id,
                        error = %err,
                        "Stored partition config invalid, treating as single partition"
                    );
                    (1, 1)
                }
            },
            None => (1, 1),
        };

        let local = self.manager.describe_task_list(true);

        // Partitions needing a remote describe this tick: all of them when
        // aggregation spans partitions, plus the retiring range mid-drain
        let fan_all = tunables.isolation_enabled || tunables.aggregate_across_partitions;
        let mut targets: BTreeSet<usize> = BTreeSet::new();
        if fan_all {
            targets.extend(1..read);
        }
        if write < read {
            targets.extend(write..read);
        }

        let deadline = tunables.update_interval / 2;
        let (observed, errors) = self.describe_partitions(&targets, deadline).await;
        for _ in 0..errors {
            self.metrics.record_observation_error();
        }
        if errors > 0 && tunables.isolation_enabled {
            // Load is partially unknown; a downscale must not race it
            self.gate.lock().unwrap().clear();
            return;
        }

        let mut load = AggregatedLoad::default();
        if fan_all {
            load.fold(&local.status);
            for response in observed.values() {
                load.fold(&response.status);
            }
        } else {
            // The local partition's estimate is authoritative
            load.total_qps = local.status.new_tasks_per_second;
        }

        let statuses: HashMap<usize, TaskListStatus> = observed
            .into_iter()
            .map(|(partition, response)| (partition, response.status))
            .collect();
        let drain_status = self
            .drain
            .lock()
            .unwrap()
            .evaluate(now, read, write, &statuses);

        let candidate = policy::decide(read, write, &load, drain_status, &tunables);
        tracing::debug!(
            task_list = %self.id,
            read,
            write,
            total_qps = load.total_qps,
            drain = %drain_status,
            candidate = %candidate,
            "Evaluated scaling policy"
        );

        let sustain = match candidate {
            Decision::Upscale { .. } => tunables.upscale_sustained,
            Decision::DownscaleWrite { .. } => tunables.downscale_sustained,
            // Completing a drain already served the downscale sustain
            Decision::DownscaleRead { .. } | Decision::NoOp => Duration::ZERO,
        };
        let admitted = self.gate.lock().unwrap().admit(now, candidate, sustain);
        if admitted.is_noop() {
            return;
        }

        let Some(new_config) = admitted.to_partition_config() else {
            return;
        };
        if (new_config.read_count(), new_config.write_count()) == (read, write) {
            return;
        }

        tracing::info!(
            task_list = %self.id,
            decision = %admitted,
            from_read = read,
            from_write = write,
            total_qps = load.total_qps,
            "Committing partition config"
        );
        let update = self
            .manager
            .update_task_list_partition_config(new_config.clone());
        match tokio::time::timeout(deadline, update).await {
            Ok(Ok(())) => {
                match admitted {
                    Decision::Upscale { .. } => self.metrics.record_upscale(),
                    Decision::DownscaleWrite { .. } => self.metrics.record_write_downscale(),
                    Decision::DownscaleRead { .. } => self.metrics.record_read_downscale(),
                    Decision::NoOp => {}
                }
                self.metrics
                    .set_partitions(new_config.read_count(), new_config.write_count());
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    task_list = %self.id,
                    error = %err,
                    "Partition config update failed, will re-evaluate next tick"
                );
                self.metrics.record_commit_error();
            }
            Err(_) => {
                tracing::warn!(
                    task_list = %self.id,
                    deadline_ms = deadline.as_millis() as u64,
                    "Partition config update timed out, will re-evaluate next tick"
                );
                self.metrics.record_commit_error();
            }
        }
    }

    /// Fan out describes to the given partitions with a per-call deadline.
    ///
    /// Returns the successful responses keyed by partition index and the
    /// number of failures.
    async fn describe_partitions(
        &self,
        targets: &BTreeSet<usize>,
        deadline: Duration,
    ) -> (HashMap<usize, DescribeResponse>, usize) {
        let describes = targets.iter().map(|&partition| {
            let request = DescribeTaskListRequest {
                domain_id: self.id.domain_id().to_string(),
                task_list_name: self.id.partition_name(partition),
                task_type: self.id.task_type(),
                include_status: true,
            };
            async move {
                let call = self.remote_client.describe_task_list(&request);
                let result = match tokio::time::timeout(deadline, call).await {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(MatchingError::RemoteTimeout(deadline.as_millis() as u64)),
                };
                (partition, request.task_list_name, result)
            }
        });

        let mut observed = HashMap::new();
        let mut errors = 0;
        for (partition, name, result) in join_all(describes).await {
            match result {
                Ok(response) => {
                    observed.insert(partition, response);
                }
                Err(err) => {
                    errors += 1;
                    tracing::warn!(
                        task_list = %self.id,
                        partition = %name,
                        error = %err,
                        "Partition describe failed"
                    );
                }
            }
        }
        (observed, errors)
    }
}
