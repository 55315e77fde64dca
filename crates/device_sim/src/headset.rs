//! Simulated headset
//!
//! Implements `PoseSource`, `HandTracker` and `FaceTracker` over a smooth
//! analytic motion model. Queries outside `[now - lookbehind, now + lookahead]`
//! fail with `TimeOutOfWindow`, like a real runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{
    Clock, DeviceId, FaceTracker, FaceWeights, Fov, HandSide, HandTracker, HardwareError,
    HardwareValidity, JointLocation, Nanos, Pose, PoseSource, Quaternion, SimulationConfig,
    SpaceLocation, Timestamp, Vector3, View, ViewFlags, ViewSet, HAND_JOINT_COUNT,
};
use nalgebra::{UnitQuaternion, Vector3 as Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// Number of simulated face blend shapes
pub const FACE_WEIGHT_COUNT: usize = 63;

const HEAD_HEIGHT: f32 = 1.6;
const IPD: f32 = 0.064;
/// Base angular frequency of the motion model (rad/s)
const MOTION_RATE: f32 = 0.8;

/// Simulated headset settings
#[derive(Debug, Clone)]
pub struct SimulatedHeadsetConfig {
    /// How far ahead the runtime can predict
    pub lookahead: Nanos,
    /// How far back the runtime remembers
    pub lookbehind: Nanos,
    /// Position noise amplitude (m)
    pub noise: f32,
    /// RNG seed
    pub seed: u64,
}

impl Default for SimulatedHeadsetConfig {
    fn default() -> Self {
        Self {
            lookahead: 100_000_000,
            lookbehind: 50_000_000,
            noise: 0.0005,
            seed: 7,
        }
    }
}

impl From<&SimulationConfig> for SimulatedHeadsetConfig {
    fn from(sim: &SimulationConfig) -> Self {
        Self {
            lookahead: contracts::millis_to_nanos(sim.lookahead_ms),
            lookbehind: contracts::millis_to_nanos(sim.lookbehind_ms),
            ..Default::default()
        }
    }
}

/// Hand visibility switches shared by all clones
#[derive(Debug)]
struct HandVisibility {
    left: AtomicBool,
    right: AtomicBool,
}

/// Simulated headset runtime
///
/// Cheap to clone; clones share the clock and hand visibility, so one clone
/// can serve as pose source while another serves as hand tracker.
#[derive(Clone)]
pub struct SimulatedHeadset {
    clock: Arc<dyn Clock>,
    config: SimulatedHeadsetConfig,
    hands: Arc<HandVisibility>,
    rng: StdRng,
}

impl SimulatedHeadset {
    pub fn new(clock: Arc<dyn Clock>, config: SimulatedHeadsetConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            clock,
            config,
            hands: Arc::new(HandVisibility {
                left: AtomicBool::new(true),
                right: AtomicBool::new(true),
            }),
            rng,
        }
    }

    /// Show or hide a hand; hidden hands report no joints
    pub fn set_hand_visible(&self, hand: HandSide, visible: bool) {
        match hand {
            HandSide::Left => self.hands.left.store(visible, Ordering::Relaxed),
            HandSide::Right => self.hands.right.store(visible, Ordering::Relaxed),
        }
    }

    fn hand_visible(&self, hand: HandSide) -> bool {
        match hand {
            HandSide::Left => self.hands.left.load(Ordering::Relaxed),
            HandSide::Right => self.hands.right.load(Ordering::Relaxed),
        }
    }

    /// Reject instants the runtime cannot answer for
    fn check_window(&self, at: Timestamp) -> Result<Nanos, HardwareError> {
        let ahead = at - self.clock.now();
        if ahead > self.config.lookahead || ahead < -self.config.lookbehind {
            trace!(at, ahead, "query outside runtime window");
            return Err(HardwareError::TimeOutOfWindow { at });
        }
        Ok(ahead)
    }

    /// Far predictions keep their pose but are no longer "tracked"
    fn validity(&self, ahead: Nanos) -> HardwareValidity {
        let tracked = ahead <= self.config.lookahead / 2;
        HardwareValidity {
            orientation_tracked: tracked,
            position_tracked: tracked,
            ..HardwareValidity::all()
        }
    }

    fn jitter(&mut self) -> Vec3<f32> {
        let n = self.config.noise;
        if n <= 0.0 {
            return Vec3::zeros();
        }
        Vec3::new(
            self.rng.random_range(-n..n),
            self.rng.random_range(-n..n),
            self.rng.random_range(-n..n),
        )
    }
}

/// Head pose of the motion model at `t` seconds
fn head_motion(t: f32) -> Motion {
    let w = MOTION_RATE;
    let position = Vec3::new(
        0.1 * (w * t).sin(),
        HEAD_HEIGHT + 0.02 * (2.0 * w * t).sin(),
        0.1 * (w * t).cos(),
    );
    let linear_velocity = Vec3::new(
        0.1 * w * (w * t).cos(),
        0.04 * w * (2.0 * w * t).cos(),
        -0.1 * w * (w * t).sin(),
    );
    let yaw = 0.5 * (w * t).sin();
    let pitch = 0.1 * (0.5 * w * t).sin();
    Motion {
        position,
        orientation: UnitQuaternion::from_euler_angles(pitch, yaw, 0.0),
        linear_velocity,
        angular_velocity: Vec3::new(0.05 * w * (0.5 * w * t).cos(), 0.5 * w * (w * t).cos(), 0.0),
    }
}

/// Rigid body state in the motion model
#[derive(Debug, Clone, Copy)]
struct Motion {
    position: Vec3<f32>,
    orientation: UnitQuaternion<f32>,
    linear_velocity: Vec3<f32>,
    angular_velocity: Vec3<f32>,
}

impl Motion {
    /// State of a point rigidly attached at `offset` in the local frame
    fn offset(&self, offset: Vec3<f32>) -> Motion {
        let arm = self.orientation * offset;
        Motion {
            position: self.position + arm,
            linear_velocity: self.linear_velocity + self.angular_velocity.cross(&arm),
            ..*self
        }
    }

    fn location(&self, validity: HardwareValidity) -> SpaceLocation {
        SpaceLocation {
            pose: pose(self.position, self.orientation),
            linear_velocity: vector(self.linear_velocity),
            angular_velocity: vector(self.angular_velocity),
            validity,
        }
    }
}

fn vector(v: Vec3<f32>) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

fn pose(position: Vec3<f32>, orientation: UnitQuaternion<f32>) -> Pose {
    let q = orientation.quaternion().coords;
    Pose {
        position: vector(position),
        orientation: Quaternion {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        },
    }
}

fn seconds(at: Timestamp) -> f32 {
    (at as f64 / 1e9) as f32
}

/// Local offset of a device from the head
fn device_offset(device: DeviceId) -> Vec3<f32> {
    match device {
        DeviceId::Head | DeviceId::EyeGaze | DeviceId::Face => Vec3::zeros(),
        DeviceId::LeftAim => Vec3::new(-0.2, -0.35, -0.35),
        DeviceId::LeftGrip | DeviceId::LeftHand => Vec3::new(-0.2, -0.4, -0.3),
        DeviceId::RightAim => Vec3::new(0.2, -0.35, -0.35),
        DeviceId::RightGrip | DeviceId::RightHand => Vec3::new(0.2, -0.4, -0.3),
    }
}

/// Joint offset from the wrist and joint radius.
///
/// 0 = palm, 1 = wrist, then the thumb (4 joints) and four fingers (5 joints
/// each), base to tip.
fn joint_offset(index: usize, side: f32) -> (Vec3<f32>, f32) {
    match index {
        0 => (Vec3::new(0.0, 0.0, -0.05), 0.02),
        1 => (Vec3::zeros(), 0.02),
        _ => {
            let k = index - 2;
            let (finger, segment) = if k < 4 {
                (0, k)
            } else {
                (1 + (k - 4) / 5, (k - 4) % 5)
            };
            let offset = Vec3::new(
                side * (finger as f32 - 2.0) * 0.02,
                0.0,
                -0.04 - segment as f32 * 0.025,
            );
            (offset, 0.011 - segment as f32 * 0.001)
        }
    }
}

impl PoseSource for SimulatedHeadset {
    fn locate_views(&mut self, at: Timestamp) -> Result<ViewSet, HardwareError> {
        let ahead = self.check_window(at)?;
        let head = head_motion(seconds(at));
        let fov = Fov {
            angle_left: -0.82,
            angle_right: 0.82,
            angle_up: 0.86,
            angle_down: -0.86,
        };
        let eye = |x: f32| {
            let m = head.offset(Vec3::new(x, 0.0, 0.0));
            View {
                pose: pose(m.position, m.orientation),
                fov,
            }
        };
        let mut flags = ViewFlags::ORIENTATION_VALID | ViewFlags::POSITION_VALID;
        if self.validity(ahead).position_tracked {
            flags |= ViewFlags::ORIENTATION_TRACKED | ViewFlags::POSITION_TRACKED;
        }
        Ok(ViewSet {
            flags,
            views: [eye(-IPD / 2.0), eye(IPD / 2.0)],
        })
    }

    fn locate(
        &mut self,
        device: DeviceId,
        at: Timestamp,
    ) -> Result<SpaceLocation, HardwareError> {
        let ahead = self.check_window(at)?;
        let head = head_motion(seconds(at));
        let mut state = head.offset(device_offset(device));
        if device != DeviceId::Head {
            state.position += self.jitter();
        }
        let mut validity = self.validity(ahead);
        if device == DeviceId::EyeGaze {
            // gaze has no velocity
            validity.linear_velocity_valid = false;
            validity.angular_velocity_valid = false;
        }
        Ok(state.location(validity))
    }
}

impl HandTracker for SimulatedHeadset {
    fn locate_hand(
        &mut self,
        hand: HandSide,
        at: Timestamp,
    ) -> Result<Option<[JointLocation; HAND_JOINT_COUNT]>, HardwareError> {
        let ahead = self.check_window(at)?;
        if !self.hand_visible(hand) {
            return Ok(None);
        }
        let (device, side) = match hand {
            HandSide::Left => (DeviceId::LeftHand, -1.0),
            HandSide::Right => (DeviceId::RightHand, 1.0),
        };
        let wrist = head_motion(seconds(at)).offset(device_offset(device));
        let validity = self.validity(ahead);

        let joints = std::array::from_fn(|i| {
            let (offset, radius) = joint_offset(i, side);
            JointLocation {
                location: wrist.offset(offset).location(validity),
                radius,
            }
        });
        Ok(Some(joints))
    }
}

impl FaceTracker for SimulatedHeadset {
    fn weights(&mut self, at: Timestamp) -> Result<FaceWeights, HardwareError> {
        self.check_window(at)?;
        let t = seconds(at);
        let weights = (0..FACE_WEIGHT_COUNT)
            .map(|i| 0.5 + 0.5 * (t * MOTION_RATE + i as f32 * 0.1).sin())
            .collect();
        Ok(FaceWeights {
            weights,
            confidences: vec![1.0, 1.0],
            is_valid: true,
            is_eye_following_blendshapes_valid: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use contracts::NANOS_PER_MILLI;

    const MS: Nanos = NANOS_PER_MILLI;

    fn headset() -> (Arc<ManualClock>, SimulatedHeadset) {
        let clock = Arc::new(ManualClock::new(10_000 * MS));
        let headset = SimulatedHeadset::new(clock.clone(), SimulatedHeadsetConfig::default());
        (clock, headset)
    }

    #[test]
    fn test_window_bounds() {
        let (clock, mut headset) = headset();
        let now = clock.now();

        assert!(headset.locate(DeviceId::Head, now).is_ok());
        assert!(headset.locate(DeviceId::Head, now + 100 * MS).is_ok());
        assert!(headset.locate(DeviceId::Head, now - 50 * MS).is_ok());

        let err = headset.locate(DeviceId::Head, now + 101 * MS).unwrap_err();
        assert!(err.is_time_out_of_window());
        assert!(headset.locate_views(now - 51 * MS).is_err());
        assert!(headset.weights(now + 200 * MS).is_err());
    }

    #[test]
    fn test_far_prediction_not_tracked() {
        let (clock, mut headset) = headset();
        let near = headset.locate(DeviceId::LeftAim, clock.now()).unwrap();
        let far = headset
            .locate(DeviceId::LeftAim, clock.now() + 80 * MS)
            .unwrap();
        assert!(near.validity.position_tracked);
        assert!(!far.validity.position_tracked);
        assert!(far.validity.position_valid);
    }

    #[test]
    fn test_head_pose_is_unit_and_near_height() {
        let (clock, mut headset) = headset();
        let head = headset.locate(DeviceId::Head, clock.now()).unwrap();
        let q = head.pose.orientation;
        let norm = (q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w).sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!((head.pose.position.y - HEAD_HEIGHT).abs() < 0.05);
    }

    #[test]
    fn test_hidden_hand_reports_none() {
        let (clock, mut headset) = headset();
        let tracker = headset.clone();
        tracker.set_hand_visible(HandSide::Right, false);

        let left = headset.locate_hand(HandSide::Left, clock.now()).unwrap();
        let right = headset.locate_hand(HandSide::Right, clock.now()).unwrap();
        assert!(right.is_none());
        assert!(left.unwrap().iter().all(|j| j.radius > 0.0));
    }

    #[test]
    fn test_face_weights_in_range() {
        let (clock, mut headset) = headset();
        let face = headset.weights(clock.now()).unwrap();
        assert_eq!(face.weights.len(), FACE_WEIGHT_COUNT);
        assert!(face.weights.iter().all(|w| (0.0..=1.0).contains(w)));
    }

    #[test]
    fn test_eye_gaze_has_no_velocity() {
        let (clock, mut headset) = headset();
        let gaze = headset.locate(DeviceId::EyeGaze, clock.now()).unwrap();
        assert!(!gaze.validity.linear_velocity_valid);
        assert!(gaze.validity.orientation_valid);
    }
}
