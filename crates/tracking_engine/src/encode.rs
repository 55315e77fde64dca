//! Runtime locations to wire records.

use contracts::{
    DeviceId, HandJoint, JointLocation, PoseSample, SpaceLocation, HAND_JOINT_COUNT,
};

use crate::flags::derive_pose_flags;

/// Joint radius scale: meters to 0.1 mm units
const RADIUS_SCALE: f32 = 10_000.0;

pub fn pose_sample(device: DeviceId, location: &SpaceLocation) -> PoseSample {
    PoseSample {
        device,
        pose: location.pose,
        linear_velocity: location.linear_velocity,
        angular_velocity: location.angular_velocity,
        flags: derive_pose_flags(location.validity),
    }
}

/// Encode one joint; the radius saturates at the u16 range and negative
/// radii become 0.
pub fn hand_joint(joint: &JointLocation) -> HandJoint {
    HandJoint {
        pose: joint.location.pose,
        linear_velocity: joint.location.linear_velocity,
        angular_velocity: joint.location.angular_velocity,
        radius: (joint.radius * RADIUS_SCALE) as u16,
        flags: derive_pose_flags(joint.location.validity),
    }
}

pub fn hand_joints(joints: &[JointLocation; HAND_JOINT_COUNT]) -> [HandJoint; HAND_JOINT_COUNT] {
    std::array::from_fn(|i| hand_joint(&joints[i]))
}
