//! Sampling scheduler configuration contracts shared across crates.

use serde::{Deserialize, Serialize};

use crate::{millis_to_nanos, Nanos};

/// Sampling scheduler tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Sampling period used for the first iteration (ms)
    #[serde(default = "default_initial_period_ms")]
    pub initial_period_ms: f64,

    /// Wake this long before the target instant (µs)
    #[serde(default = "default_wake_lead_us")]
    pub wake_lead_us: u64,

    /// Interval between battery polls (s)
    #[serde(default = "default_battery_interval_s")]
    pub battery_interval_s: f64,
}

fn default_initial_period_ms() -> f64 {
    1.0
}

fn default_wake_lead_us() -> u64 {
    100
}

fn default_battery_interval_s() -> f64 {
    30.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_period_ms: default_initial_period_ms(),
            wake_lead_us: default_wake_lead_us(),
            battery_interval_s: default_battery_interval_s(),
        }
    }
}

impl SchedulerConfig {
    /// Initial sampling period (ns)
    pub fn initial_period(&self) -> Nanos {
        millis_to_nanos(self.initial_period_ms)
    }

    /// Wake-up lead (ns)
    pub fn wake_lead(&self) -> Nanos {
        self.wake_lead_us as Nanos * 1_000
    }

    /// Battery poll interval (ns)
    pub fn battery_interval(&self) -> Nanos {
        (self.battery_interval_s * 1e9).round() as Nanos
    }
}
