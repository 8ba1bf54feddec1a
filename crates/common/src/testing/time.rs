//! Controllable wall clock for tests

#![allow(clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::time::Clock;

/// Mock clock for deterministic testing
///
/// Clones share the same underlying time, so a clone handed to the cache can
/// be driven from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a mock clock starting at the current real time
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create a mock clock frozen at `start`
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Advance the clock without real time passing
    pub fn advance(&self, duration: Duration) {
        // Test utility: panic on poisoned mutex to fail tests early
        let mut now = self.now.lock().expect("mutex poisoned");
        *now += duration;
    }

    /// Jump to an absolute time (may move backwards)
    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().expect("mutex poisoned");
        *now = to;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("mutex poisoned")
    }
}
