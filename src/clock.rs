//! Time source abstraction — injected clock for the scaler and trackers
//!
//! Production code reads the wall clock through `SystemTimeSource`; tests
//! drive `MockTimeSource` forward manually so sustain windows and QPS
//! buckets can be exercised deterministically.

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of monotonically non-decreasing timestamps.
///
/// Timestamps are durations since the Unix epoch; only differences between
/// them are meaningful to callers.
pub trait TimeSource: Send + Sync {
    /// Current time
    fn now(&self) -> Duration;
}

/// Wall-clock time source
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Manually-advanceable time source for tests
#[derive(Debug)]
pub struct MockTimeSource {
    now: Mutex<Duration>,
}

impl MockTimeSource {
    /// Create a mock clock at the given instant
    pub fn new(start: Duration) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Advance the clock by `d`
    pub fn advance(&self, d: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += d;
    }
}

impl Default for MockTimeSource {
    fn default() -> Self {
        // Arbitrary nonzero origin so subtraction never underflows
        Self::new(Duration::from_secs(1_700_000_000))
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}
