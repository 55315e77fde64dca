//! Busy-time stopwatch.

use std::sync::Arc;

use contracts::{Clock, Nanos, Timestamp};

/// Accumulates time between `resume` and `pause` calls.
///
/// Starts paused. Negative intervals (a clock that stepped backwards) count
/// as zero.
pub struct BusyTimer {
    clock: Arc<dyn Clock>,
    started: Option<Timestamp>,
    accumulated: Nanos,
}

impl BusyTimer {
    /// Paused timer at zero
    pub fn paused(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            started: None,
            accumulated: 0,
        }
    }

    /// Running timer at zero
    pub fn running(clock: Arc<dyn Clock>) -> Self {
        let mut timer = Self::paused(clock);
        timer.resume();
        timer
    }

    pub fn resume(&mut self) {
        if self.started.is_none() {
            self.started = Some(self.clock.now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += (self.clock.now() - started).max(0);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Accumulated time, including the running interval
    pub fn elapsed(&self) -> Nanos {
        let running = self
            .started
            .map_or(0, |started| (self.clock.now() - started).max(0));
        self.accumulated + running
    }

    /// Pause and zero
    pub fn reset(&mut self) {
        self.started = None;
        self.accumulated = 0;
    }
}

impl std::fmt::Debug for BusyTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusyTimer")
            .field("started", &self.started)
            .field("accumulated", &self.accumulated)
            .finish()
    }
}
