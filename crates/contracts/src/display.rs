//! DisplayTiming - display cadence published by the render loop

use std::sync::atomic::{AtomicI64, Ordering};

use crate::{Nanos, Timestamp};

/// Latest display refresh period and phase.
///
/// Written by the render loop every frame, read by the sampling scheduler once
/// per burst. Period and phase are independent atomics; a reader may briefly
/// pair a new period with the previous phase, which only shifts one burst.
#[derive(Debug)]
pub struct DisplayTiming {
    period: AtomicI64,
    phase: AtomicI64,
}

impl DisplayTiming {
    /// Timing with a known period and zero phase
    pub fn new(period: Nanos) -> Self {
        Self {
            period: AtomicI64::new(period),
            phase: AtomicI64::new(0),
        }
    }

    /// Timing derived from a refresh rate
    pub fn from_refresh_rate(hz: f64) -> Self {
        Self::new(period_from_refresh_rate(hz))
    }

    /// Record a predicted display time and the current frame period
    pub fn observe(&self, predicted_display_time: Timestamp, period: Nanos) {
        self.period.store(period, Ordering::Relaxed);
        if period > 0 {
            self.phase
                .store(predicted_display_time.rem_euclid(period), Ordering::Relaxed);
        }
    }

    /// Display frame period (ns)
    pub fn period(&self) -> Nanos {
        self.period.load(Ordering::Relaxed)
    }

    /// Display phase: predicted display time modulo period (ns)
    pub fn phase(&self) -> Nanos {
        self.phase.load(Ordering::Relaxed)
    }
}

impl Default for DisplayTiming {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Frame period for a refresh rate in Hz
pub(crate) fn period_from_refresh_rate(hz: f64) -> Nanos {
    if hz > 0.0 {
        (1e9 / hz).round() as Nanos
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_sets_phase() {
        let timing = DisplayTiming::default();
        timing.observe(1_000_000_123, 11_111_111);
        assert_eq!(timing.period(), 11_111_111);
        assert_eq!(timing.phase(), 1_000_000_123 % 11_111_111);
    }

    #[test]
    fn test_refresh_rate() {
        let timing = DisplayTiming::from_refresh_rate(90.0);
        assert_eq!(timing.period(), 11_111_111);
        assert_eq!(timing.phase(), 0);
    }

    #[test]
    fn test_zero_period_keeps_phase() {
        let timing = DisplayTiming::new(10);
        timing.observe(25, 10);
        timing.observe(99, 0);
        assert_eq!(timing.phase(), 5);
    }
}
