//! Hardware collaborator traits consumed by the sampling scheduler.
//!
//! All calls are synchronous and happen on the scheduler thread.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    BatteryPacket, DeviceId, FaceWeights, HandSide, HardwareError, JointLocation, Nanos,
    SpaceLocation, Timestamp, ViewSet, HAND_JOINT_COUNT,
};

/// Headset runtime clock
pub trait Clock: Send + Sync {
    /// Current runtime time
    fn now(&self) -> Timestamp;

    /// Block the calling thread; non-positive durations return immediately
    fn sleep(&self, duration: Nanos);
}

/// Pose-location API of the tracking runtime
pub trait PoseSource: Send {
    /// Locate both eye views at `at`
    fn locate_views(&mut self, at: Timestamp) -> Result<ViewSet, HardwareError>;

    /// Locate a device at `at`
    ///
    /// # Errors
    /// `TimeOutOfWindow` when `at` is outside the supported range; anything
    /// else is a runtime failure.
    fn locate(&mut self, device: DeviceId, at: Timestamp) -> Result<SpaceLocation, HardwareError>;
}

/// Hand joint tracker
pub trait HandTracker: Send {
    /// Locate all joints of one hand; `Ok(None)` when the hand is not seen
    fn locate_hand(
        &mut self,
        hand: HandSide,
        at: Timestamp,
    ) -> Result<Option<[JointLocation; HAND_JOINT_COUNT]>, HardwareError>;
}

/// Face expression tracker
pub trait FaceTracker: Send {
    fn weights(&mut self, at: Timestamp) -> Result<FaceWeights, HardwareError>;
}

/// Platform battery query
pub trait BatteryProvider: Send {
    fn poll(&mut self) -> BatteryPacket;
}

/// Optional platform capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    EyeGaze,
    HandTracking,
    FaceTracking,
    Battery,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::EyeGaze => "eye_gaze",
            Capability::HandTracking => "hand_tracking",
            Capability::FaceTracking => "face_tracking",
            Capability::Battery => "battery",
        };
        f.write_str(name)
    }
}

/// Platform capability queries; answered fresh on every call
pub trait Capabilities: Send + Sync {
    fn supports(&self, capability: Capability) -> bool;
}
