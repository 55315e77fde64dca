//! Pose primitives shared between the tracking runtime and the wire packets.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Number of joints reported per hand
pub const HAND_JOINT_COUNT: usize = 26;

/// 3D vector (meters, m/s or rad/s depending on context)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Unit quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

/// Rigid pose: position + orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3,
    pub orientation: Quaternion,
}

/// Field of view half-angles (radians)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fov {
    pub angle_left: f32,
    pub angle_right: f32,
    pub angle_up: f32,
    pub angle_down: f32,
}

/// One eye view
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub pose: Pose,
    pub fov: Fov,
}

bitflags! {
    /// 6-bit pose validity mask carried on the wire
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PoseFlags: u8 {
        const ORIENTATION_VALID = 1 << 0;
        const POSITION_VALID = 1 << 1;
        const LINEAR_VELOCITY_VALID = 1 << 2;
        const ANGULAR_VELOCITY_VALID = 1 << 3;
        const ORIENTATION_TRACKED = 1 << 4;
        const POSITION_TRACKED = 1 << 5;
    }
}

bitflags! {
    /// View state flags reported with the eye views
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ViewFlags: u8 {
        const ORIENTATION_VALID = 1 << 0;
        const POSITION_VALID = 1 << 1;
        const ORIENTATION_TRACKED = 1 << 2;
        const POSITION_TRACKED = 1 << 3;
    }
}

bitflags! {
    /// Tracking packet state flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StateFlags: u8 {
        /// The local reference space origin changed since the last report
        const RECENTERED = 1 << 0;
    }
}

/// Raw validity facts reported by the tracking runtime for one location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HardwareValidity {
    pub orientation_valid: bool,
    pub position_valid: bool,
    pub linear_velocity_valid: bool,
    pub angular_velocity_valid: bool,
    pub orientation_tracked: bool,
    pub position_tracked: bool,
}

impl HardwareValidity {
    /// Every fact set
    pub const fn all() -> Self {
        Self {
            orientation_valid: true,
            position_valid: true,
            linear_velocity_valid: true,
            angular_velocity_valid: true,
            orientation_tracked: true,
            position_tracked: true,
        }
    }
}

/// Location of a tracking space at an instant
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpaceLocation {
    pub pose: Pose,
    pub linear_velocity: Vector3,
    pub angular_velocity: Vector3,
    pub validity: HardwareValidity,
}

/// Result of a stereo view query
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewSet {
    pub flags: ViewFlags,
    pub views: [View; 2],
}

/// Location of one hand joint
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointLocation {
    pub location: SpaceLocation,
    /// Joint radius in meters
    pub radius: f32,
}

/// Which hand a packet describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSide {
    Left,
    Right,
}

/// Face expression weights at an instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceWeights {
    /// Blend shape weights in [0, 1]
    pub weights: Vec<f32>,
    /// Per-region confidences
    pub confidences: Vec<f32>,
    pub is_valid: bool,
    pub is_eye_following_blendshapes_valid: bool,
}
