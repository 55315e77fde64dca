//! Prediction window: the Δt offsets one burst samples.

use contracts::{Nanos, Timestamp, NANOS_PER_MILLI};

/// Upper bound on the prediction offset a peer may request
pub const MAX_PREDICTION: Nanos = 80 * NANOS_PER_MILLI;

/// Floor applied to the display period when stepping the window
pub const MIN_WINDOW_STEP: Nanos = NANOS_PER_MILLI;

/// Clamp a requested offset to `[0, MAX_PREDICTION]`
pub fn clamp_prediction(offset: Nanos) -> Nanos {
    offset.clamp(0, MAX_PREDICTION)
}

/// Cursor over `Δt = 0, p, 2p, ...` while `Δt <= o + p/2`.
///
/// After the first sample the cursor may be shifted once onto the display
/// phase (see [`PredictionWindow::align_to_display`]); stepping resumes from
/// the shifted value.
#[derive(Debug, Clone)]
pub struct PredictionWindow {
    prediction: Nanos,
    step: Nanos,
    horizon: Nanos,
    cursor: Option<Nanos>,
    aligned: bool,
}

impl PredictionWindow {
    /// `prediction` is clamped; `display_period` is floored at 1 ms
    pub fn new(prediction: Nanos, display_period: Nanos) -> Self {
        let prediction = clamp_prediction(prediction);
        let step = display_period.max(MIN_WINDOW_STEP);
        Self {
            prediction,
            step,
            horizon: prediction + step / 2,
            cursor: None,
            aligned: false,
        }
    }

    pub fn prediction(&self) -> Nanos {
        self.prediction
    }

    pub fn step(&self) -> Nanos {
        self.step
    }

    /// Inclusive upper bound on Δt
    pub fn horizon(&self) -> Nanos {
        self.horizon
    }

    /// Sample count of an unshifted window: `floor((o + p/2) / p) + 1`
    pub fn unaligned_len(&self) -> usize {
        (self.horizon / self.step) as usize + 1
    }

    /// Shift the cursor onto the display phase.
    ///
    /// Applies only right after the Δt = 0 sample, only when predicting, and
    /// at most once per window. The new Δt is
    /// `phase - (t0 mod p) + skip_samples * p`; the next sample is one step
    /// later. Returns the shifted Δt when applied.
    pub fn align_to_display(
        &mut self,
        display_phase: Nanos,
        t0: Timestamp,
        skip_samples: u32,
    ) -> Option<Nanos> {
        if self.aligned || self.prediction == 0 || self.cursor != Some(0) {
            return None;
        }
        let shifted =
            display_phase - t0.rem_euclid(self.step) + Nanos::from(skip_samples) * self.step;
        self.cursor = Some(shifted);
        self.aligned = true;
        Some(shifted)
    }
}

impl Iterator for PredictionWindow {
    type Item = Nanos;

    fn next(&mut self) -> Option<Nanos> {
        let next = match self.cursor {
            None => 0,
            Some(dt) => dt.saturating_add(self.step),
        };
        if next > self.horizon {
            return None;
        }
        self.cursor = Some(next);
        Some(next)
    }
}
