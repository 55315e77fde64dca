//! Clock implementations
//!
//! - `MonotonicClock`: wall-clock backed, for live sessions
//! - `ManualClock`: moves only when slept on or advanced, for tests and replays

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use contracts::{Clock, Nanos, Timestamp};

/// Monotonic runtime clock
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
    base: Timestamp,
}

impl MonotonicClock {
    /// Clock reading 0 at construction
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Clock reading `base` at construction
    pub fn starting_at(base: Timestamp) -> Self {
        Self {
            origin: Instant::now(),
            base,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        let elapsed = i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX);
        self.base.saturating_add(elapsed)
    }

    fn sleep(&self, duration: Nanos) {
        if duration > 0 {
            thread::sleep(Duration::from_nanos(duration as u64));
        }
    }
}

/// Manually driven clock
///
/// `sleep` advances the clock instead of blocking.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
    sleeps: AtomicU64,
    slept: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
            ..Default::default()
        }
    }

    pub fn set(&self, t: Timestamp) {
        self.now.store(t, Ordering::SeqCst);
    }

    /// Move forward (or backward, for negative `d`)
    pub fn advance(&self, d: Nanos) {
        self.now.fetch_add(d, Ordering::SeqCst);
    }

    /// Number of positive sleeps
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Total time slept
    pub fn total_slept(&self) -> Nanos {
        self.slept.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Nanos) {
        if duration > 0 {
            self.sleeps.fetch_add(1, Ordering::SeqCst);
            self.slept.fetch_add(duration, Ordering::SeqCst);
            self.advance(duration);
        }
    }
}
