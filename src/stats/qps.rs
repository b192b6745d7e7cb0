//! Fixed-window QPS estimators
//!
//! A ring of one-second buckets over a sliding window. Rotation is applied
//! lazily on every report and read using the injected time source, so the
//! estimate is exact under a mocked clock; a background task additionally
//! rotates the ring so an idle tracker's rate decays without reads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::TimeSource;
use crate::error::{MatchingError, Result};
use crate::stats::{QpsTracker, QpsTrackerGroup};

const STATUS_INITIALIZED: u8 = 0;
const STATUS_STARTED: u8 = 1;
const STATUS_STOPPED: u8 = 2;

/// Default sliding-window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);
/// Bucket granularity
const BUCKET_INTERVAL: Duration = Duration::from_secs(1);

/// Ring of counting buckets over a sliding window
#[derive(Debug)]
struct Ring {
    buckets: Vec<i64>,
    head: usize,
    head_start: Duration,
    created_at: Duration,
}

impl Ring {
    fn new(window: Duration, now: Duration) -> Self {
        let len = (window.as_secs_f64() / BUCKET_INTERVAL.as_secs_f64()).ceil() as usize;
        Self {
            buckets: vec![0; len.max(1)],
            head: 0,
            head_start: now,
            created_at: now,
        }
    }

    /// Advance the head past every bucket boundary crossed since the last call
    fn rotate(&mut self, now: Duration) {
        let elapsed = now.saturating_sub(self.head_start);
        let steps = (elapsed.as_nanos() / BUCKET_INTERVAL.as_nanos()) as u64;
        if steps == 0 {
            return;
        }
        let len = self.buckets.len() as u64;
        if steps >= len {
            // Entire window elapsed; restart it at the current instant
            self.buckets.iter_mut().for_each(|b| *b = 0);
            self.head = 0;
            self.head_start = now;
        } else {
            for _ in 0..steps {
                self.head = (self.head + 1) % self.buckets.len();
                self.buckets[self.head] = 0;
            }
            self.head_start += BUCKET_INTERVAL * steps as u32;
        }
    }

    fn add(&mut self, now: Duration, delta: i64) {
        self.rotate(now);
        self.buckets[self.head] += delta;
    }

    /// Rate over the observed portion of the window.
    ///
    /// Young rings divide by the time actually covered so the estimate is
    /// not diluted by buckets that never existed.
    fn rate(&mut self, now: Duration) -> f64 {
        self.rotate(now);
        let window = BUCKET_INTERVAL * self.buckets.len() as u32;
        let covered = now
            .saturating_sub(self.created_at)
            .saturating_add(BUCKET_INTERVAL)
            .min(window)
            .max(BUCKET_INTERVAL);
        let total: i64 = self.buckets.iter().sum();
        total as f64 / covered.as_secs_f64()
    }
}

/// Fixed-window QPS tracker for a single counter
pub struct WindowedQpsTracker {
    time_source: Arc<dyn TimeSource>,
    ring: Arc<Mutex<Ring>>,
    status: AtomicU8,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl WindowedQpsTracker {
    /// Create a tracker with the default 30s window
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self::with_window(time_source, DEFAULT_WINDOW)
    }

    /// Create a tracker with a custom window length
    pub fn with_window(time_source: Arc<dyn TimeSource>, window: Duration) -> Self {
        let now = time_source.now();
        Self {
            time_source,
            ring: Arc::new(Mutex::new(Ring::new(window, now))),
            status: AtomicU8::new(STATUS_INITIALIZED),
            handle: Mutex::new(None),
        }
    }

    fn is_stopped(&self) -> bool {
        self.status.load(Ordering::Acquire) == STATUS_STOPPED
    }
}

impl QpsTracker for WindowedQpsTracker {
    fn start(&self) {
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

        // The daemon only matters on a live runtime; under a mocked clock
        // the lazy rotation in report/read keeps the estimate exact.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let time_source = self.time_source.clone();
            let ring = self.ring.clone();
            let task = runtime.spawn(async move {
                let mut tick = tokio::time::interval(BUCKET_INTERVAL);
                tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tick.tick().await;
                    let now = time_source.now();
                    ring.lock().unwrap().rotate(now);
                }
            });
            *self.handle.lock().unwrap() = Some(task);
        }
    }

    fn stop(&self) {
        self.status.store(STATUS_STOPPED, Ordering::Release);
        if let Some(task) = self.handle.lock().unwrap().take() {
            task.abort();
        }
    }

    fn report_counter(&self, delta: i64) -> Result<()> {
        if self.is_stopped() {
            return Err(MatchingError::TrackerStopped);
        }
        let now = self.time_source.now();
        self.ring.lock().unwrap().add(now, delta);
        Ok(())
    }

    fn qps(&self) -> f64 {
        let now = self.time_source.now();
        self.ring.lock().unwrap().rate(now)
    }
}

impl Drop for WindowedQpsTracker {
    fn drop(&mut self) {
        if let Some(task) = self.handle.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// QPS tracker with a per-isolation-group breakdown.
///
/// Group reports contribute to both the group's ring and the overall rate,
/// so `qps()` always covers the full partition load.
pub struct GroupedQpsTracker {
    total: WindowedQpsTracker,
    groups: Mutex<HashMap<String, Ring>>,
    time_source: Arc<dyn TimeSource>,
    window: Duration,
}

impl GroupedQpsTracker {
    /// Create a grouped tracker with the default 30s window
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self::with_window(time_source, DEFAULT_WINDOW)
    }

    /// Create a grouped tracker with a custom window length
    pub fn with_window(time_source: Arc<dyn TimeSource>, window: Duration) -> Self {
        Self {
            total: WindowedQpsTracker::with_window(time_source.clone(), window),
            groups: Mutex::new(HashMap::new()),
            time_source,
            window,
        }
    }

    /// Groups that have reported at least once
    pub fn groups(&self) -> Vec<String> {
        self.groups.lock().unwrap().keys().cloned().collect()
    }
}

impl QpsTracker for GroupedQpsTracker {
    fn start(&self) {
        self.total.start();
    }

    fn stop(&self) {
        self.total.stop();
    }

    fn report_counter(&self, delta: i64) -> Result<()> {
        self.total.report_counter(delta)
    }

    fn qps(&self) -> f64 {
        self.total.qps()
    }
}

impl QpsTrackerGroup for GroupedQpsTracker {
    fn report_group(&self, group: &str, delta: i64) -> Result<()> {
        // Total first so the stopped check happens exactly once
        self.total.report_counter(delta)?;
        let now = self.time_source.now();
        let mut groups = self.groups.lock().unwrap();
        let ring = groups
            .entry(group.to_string())
            .or_insert_with(|| Ring::new(self.window, now));
        ring.add(now, delta);
        Ok(())
    }

    fn group_qps(&self, group: &str) -> f64 {
        let now = self.time_source.now();
        let mut groups = self.groups.lock().unwrap();
        match groups.get_mut(group) {
            Some(ring) => ring.rate(now),
            None => 0.0,
        }
    }
}
