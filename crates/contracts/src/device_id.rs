//! DeviceId - closed set of tracked devices

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracked device identifier.
///
/// The set is fixed at compile time; matches over it are exhaustive so a new
/// variant forces every gating site to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceId {
    Head,
    EyeGaze,
    LeftAim,
    LeftGrip,
    RightAim,
    RightGrip,
    LeftHand,
    RightHand,
    Face,
}

impl DeviceId {
    /// All device ids, in wire order
    pub const ALL: [DeviceId; 9] = [
        DeviceId::Head,
        DeviceId::EyeGaze,
        DeviceId::LeftAim,
        DeviceId::LeftGrip,
        DeviceId::RightAim,
        DeviceId::RightGrip,
        DeviceId::LeftHand,
        DeviceId::RightHand,
        DeviceId::Face,
    ];

    /// Stable snake_case name (used for logs and metric labels)
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceId::Head => "head",
            DeviceId::EyeGaze => "eye_gaze",
            DeviceId::LeftAim => "left_aim",
            DeviceId::LeftGrip => "left_grip",
            DeviceId::RightAim => "right_aim",
            DeviceId::RightGrip => "right_grip",
            DeviceId::LeftHand => "left_hand",
            DeviceId::RightHand => "right_hand",
            DeviceId::Face => "face",
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
