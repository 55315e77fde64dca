//! # Contracts
//!
//! Frozen interface contracts (ICD) between the headset telemetry crates.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Instants are headset runtime time in nanoseconds (`Timestamp`, i64)
//! - Durations are signed nanoseconds (`Nanos`); phase realignment may go negative
//! - Configuration is written in milliseconds/seconds and converted at load time

mod blueprint;
mod control;
mod device_id;
mod display;
mod error;
mod hardware;
mod packet;
mod pose;
mod report;
mod scheduler_config;
mod transport;

pub use blueprint::*;
pub use control::{ControlBit, TrackingControl};
pub use device_id::DeviceId;
pub use display::DisplayTiming;
pub use error::*;
pub use hardware::*;
pub use packet::*;
pub use pose::*;
pub use report::{BurstReport, SchedulerReport};
pub use scheduler_config::*;
pub use transport::{LocalPacketSink, PacketSink, Transport};

/// Headset runtime instant (nanoseconds)
pub type Timestamp = i64;

/// Signed duration in nanoseconds
pub type Nanos = i64;

/// Nanoseconds per millisecond
pub const NANOS_PER_MILLI: Nanos = 1_000_000;

/// Convert fractional milliseconds to nanoseconds
#[inline]
pub fn millis_to_nanos(ms: f64) -> Nanos {
    (ms * NANOS_PER_MILLI as f64).round() as Nanos
}

/// Convert nanoseconds to fractional milliseconds
#[inline]
pub fn nanos_to_millis(ns: Nanos) -> f64 {
    ns as f64 / NANOS_PER_MILLI as f64
}
