//! Per-burst scheduler report, consumed by observability.

use serde::{Deserialize, Serialize};

use crate::{Nanos, Timestamp};

/// What one sampling burst did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstReport {
    /// Target instant of the burst
    pub t0: Timestamp,
    /// Clamped prediction offset used for the window
    pub prediction: Nanos,
    /// Window iterations, including samples rejected by the runtime
    pub samples: usize,
    /// Samples whose tracking packet was sent
    pub emitted: usize,
    /// Samples rejected with `TimeOutOfWindow` before any packet was sent
    pub out_of_window: usize,
    /// Packets handed to the transport
    pub packets: usize,
    /// Time spent inside transmission calls
    pub busy: Nanos,
    /// Whether this burst carried the recenter flag
    pub recentered: bool,
    /// Sampling period chosen for the next iteration
    pub next_period: Nanos,
    /// Skip count chosen for the next realignment
    pub skip_samples: u32,
}

/// Running totals over a scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerReport {
    pub iterations: u64,
    pub samples: u64,
    pub emitted: u64,
    pub out_of_window: u64,
    pub packets: u64,
    pub recenters: u64,
    pub battery_polls: u64,
    /// Sampling period at the end of the run
    pub final_period: Nanos,
}

impl SchedulerReport {
    /// Fold one burst into the totals
    pub fn record(&mut self, burst: &BurstReport) {
        self.iterations += 1;
        self.samples += burst.samples as u64;
        self.emitted += burst.emitted as u64;
        self.out_of_window += burst.out_of_window as u64;
        self.packets += burst.packets as u64;
        if burst.recentered {
            self.recenters += 1;
        }
        self.final_period = burst.next_period;
    }
}
