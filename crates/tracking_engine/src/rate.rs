//! Adaptive sampling rate.
//!
//! The sampling period follows five times the measured busy time, smoothed and
//! clamped to `[MIN_PERIOD, MAX_PERIOD]`. When a single sample costs more than
//! `OVERLOAD_THRESHOLD`, the next realignment skips ahead.

use contracts::{Nanos, NANOS_PER_MILLI};

pub const MIN_PERIOD: Nanos = NANOS_PER_MILLI;
pub const MAX_PERIOD: Nanos = 5 * NANOS_PER_MILLI;
pub const OVERLOAD_THRESHOLD: Nanos = 2 * NANOS_PER_MILLI;

/// Target period as a multiple of busy time
const BUSY_FACTOR: f64 = 5.0;
/// Weight of the new target in the moving average
const SMOOTHING: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateController {
    period: Nanos,
    skip_samples: u32,
}

impl RateController {
    pub fn new(initial_period: Nanos) -> Self {
        Self {
            period: initial_period.clamp(MIN_PERIOD, MAX_PERIOD),
            skip_samples: 0,
        }
    }

    /// Current sampling period
    pub fn period(&self) -> Nanos {
        self.period
    }

    /// Samples to skip on the next realignment
    pub fn skip_samples(&self) -> u32 {
        self.skip_samples
    }

    /// Fold in one burst's busy time and sample count
    pub fn update(&mut self, busy: Nanos, samples: usize) {
        let target = busy.max(0) as f64 * BUSY_FACTOR;
        let smoothed = lerp(self.period as f64, target, SMOOTHING);
        self.period = (smoothed.round() as Nanos).clamp(MIN_PERIOD, MAX_PERIOD);
        self.skip_samples = overload_skip(busy, samples);
    }
}

impl Default for RateController {
    fn default() -> Self {
        Self::new(MIN_PERIOD)
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// `floor(per_sample / OVERLOAD_THRESHOLD)` when the per-sample cost exceeds
/// the threshold, else 0
pub fn overload_skip(busy: Nanos, samples: usize) -> u32 {
    if samples == 0 {
        return 0;
    }
    let per_sample = busy.max(0) / samples as Nanos;
    if per_sample > OVERLOAD_THRESHOLD {
        u32::try_from(per_sample / OVERLOAD_THRESHOLD).unwrap_or(u32::MAX)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Nanos = NANOS_PER_MILLI;

    #[test]
    fn test_initial_period_clamped() {
        assert_eq!(RateController::new(0).period(), MIN_PERIOD);
        assert_eq!(RateController::new(50 * MS).period(), MAX_PERIOD);
        assert_eq!(RateController::new(3 * MS).period(), 3 * MS);
    }

    #[test]
    fn test_single_update() {
        let mut rate = RateController::new(MS);
        // lerp(1ms, 5 * 0.6ms, 0.2) = 1.4ms
        rate.update(600_000, 1);
        assert_eq!(rate.period(), 1_400_000);
    }

    #[test]
    fn test_converges_monotonically_to_five_busy() {
        let mut rate = RateController::new(MS);
        let busy = 800_000; // target 4ms
        let mut last = rate.period();
        for _ in 0..200 {
            rate.update(busy, 1);
            assert!(rate.period() >= last);
            last = rate.period();
        }
        assert!((rate.period() - 4 * MS).abs() <= 5);
    }

    #[test]
    fn test_saturates_at_bounds() {
        let mut rate = RateController::new(MS);
        for _ in 0..100 {
            rate.update(10 * MS, 5);
            assert!(rate.period() <= MAX_PERIOD);
        }
        assert_eq!(rate.period(), MAX_PERIOD);

        for _ in 0..100 {
            rate.update(0, 1);
            assert!(rate.period() >= MIN_PERIOD);
        }
        assert_eq!(rate.period(), MIN_PERIOD);
    }

    #[test]
    fn test_overload_skip() {
        assert_eq!(overload_skip(0, 0), 0);
        assert_eq!(overload_skip(10 * MS, 0), 0);
        // exactly at threshold is not overload
        assert_eq!(overload_skip(2 * MS, 1), 0);
        assert_eq!(overload_skip(5 * MS, 1), 2);
        assert_eq!(overload_skip(12 * MS, 2), 3);
        assert_eq!(overload_skip(12 * MS, 6), 0);
    }

    #[test]
    fn test_skip_recomputed_each_update() {
        let mut rate = RateController::default();
        rate.update(9 * MS, 1);
        assert_eq!(rate.skip_samples(), 4);
        rate.update(MS, 1);
        assert_eq!(rate.skip_samples(), 0);
    }
}
