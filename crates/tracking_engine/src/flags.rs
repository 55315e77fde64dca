//! Pose validity mask derivation.

use contracts::{HardwareValidity, PoseFlags};

/// Map the runtime's validity facts onto the 6-bit wire mask.
///
/// Each bit is set iff the matching fact holds; no bit depends on another.
pub fn derive_pose_flags(validity: HardwareValidity) -> PoseFlags {
    let mut flags = PoseFlags::empty();
    flags.set(PoseFlags::ORIENTATION_VALID, validity.orientation_valid);
    flags.set(PoseFlags::POSITION_VALID, validity.position_valid);
    flags.set(PoseFlags::LINEAR_VELOCITY_VALID, validity.linear_velocity_valid);
    flags.set(PoseFlags::ANGULAR_VELOCITY_VALID, validity.angular_velocity_valid);
    flags.set(PoseFlags::ORIENTATION_TRACKED, validity.orientation_tracked);
    flags.set(PoseFlags::POSITION_TRACKED, validity.position_tracked);
    flags
}
