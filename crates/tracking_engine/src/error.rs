//! Scheduler errors.

use contracts::{HardwareError, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A hardware call failed with something other than `TimeOutOfWindow`
    #[error("hardware failure while sampling t={at}: {source}")]
    Hardware {
        at: Timestamp,
        #[source]
        source: HardwareError,
    },
}

impl SchedulerError {
    pub fn hardware(at: Timestamp, source: HardwareError) -> Self {
        Self::Hardware { at, source }
    }
}
