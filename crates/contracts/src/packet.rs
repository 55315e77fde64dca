//! Telemetry packets emitted by the sampling scheduler.
//!
//! The scheduler emits borrowed [`Packet`]s (the tracking packet buffer is reused
//! between samples); transports that need to keep a packet convert it into the
//! owned [`TelemetryPacket`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    DeviceId, FaceWeights, HandSide, Pose, PoseFlags, StateFlags, Timestamp, Vector3, View,
    ViewFlags, HAND_JOINT_COUNT,
};

/// One device pose at one sampled instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub device: DeviceId,
    pub pose: Pose,
    pub linear_velocity: Vector3,
    pub angular_velocity: Vector3,
    pub flags: PoseFlags,
}

/// Primary tracking packet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingPacket {
    /// Instant the burst was produced for (t0)
    pub production_timestamp: Timestamp,
    /// Predicted instant (t0 + Δt)
    pub timestamp: Timestamp,
    pub views: [View; 2],
    pub view_flags: ViewFlags,
    pub state_flags: StateFlags,
    /// Poses for enabled and available devices only
    pub device_poses: Vec<PoseSample>,
}

/// One hand joint on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HandJoint {
    pub pose: Pose,
    pub linear_velocity: Vector3,
    pub angular_velocity: Vector3,
    /// Radius in units of 0.1 mm (meters × 10000)
    pub radius: u16,
    pub flags: PoseFlags,
}

/// Hand tracking packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandTrackingPacket {
    pub hand: HandSide,
    pub production_timestamp: Timestamp,
    pub timestamp: Timestamp,
    /// `None` when the runtime had no joint data for this hand
    pub joints: Option<[HandJoint; HAND_JOINT_COUNT]>,
}

/// Face tracking packet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceTrackingPacket {
    pub production_timestamp: Timestamp,
    pub timestamp: Timestamp,
    pub weights: FaceWeights,
}

/// Battery status packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryPacket {
    pub present: bool,
    /// Charge in [0, 1]
    pub charge: f32,
    pub charging: bool,
}

/// Packet kind (for logs and metric labels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    Tracking,
    Hand,
    Face,
    Battery,
}

impl PacketKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PacketKind::Tracking => "tracking",
            PacketKind::Hand => "hand",
            PacketKind::Face => "face",
            PacketKind::Battery => "battery",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed packet handed to a [`crate::Transport`]
#[derive(Debug, Clone, Copy)]
pub enum Packet<'a> {
    Tracking(&'a TrackingPacket),
    Hand(&'a HandTrackingPacket),
    Face(&'a FaceTrackingPacket),
    Battery(&'a BatteryPacket),
}

impl Packet<'_> {
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Tracking(_) => PacketKind::Tracking,
            Packet::Hand(_) => PacketKind::Hand,
            Packet::Face(_) => PacketKind::Face,
            Packet::Battery(_) => PacketKind::Battery,
        }
    }

    /// Copy into an owned packet
    pub fn to_owned_packet(&self) -> TelemetryPacket {
        match *self {
            Packet::Tracking(p) => TelemetryPacket::Tracking(p.clone()),
            Packet::Hand(p) => TelemetryPacket::Hand(p.clone()),
            Packet::Face(p) => TelemetryPacket::Face(p.clone()),
            Packet::Battery(p) => TelemetryPacket::Battery(*p),
        }
    }
}

/// Owned telemetry packet (what sinks receive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryPacket {
    Tracking(TrackingPacket),
    Hand(HandTrackingPacket),
    Face(FaceTrackingPacket),
    Battery(BatteryPacket),
}

impl TelemetryPacket {
    pub fn kind(&self) -> PacketKind {
        match self {
            TelemetryPacket::Tracking(_) => PacketKind::Tracking,
            TelemetryPacket::Hand(_) => PacketKind::Hand,
            TelemetryPacket::Face(_) => PacketKind::Face,
            TelemetryPacket::Battery(_) => PacketKind::Battery,
        }
    }

    /// Predicted timestamp, if the packet carries one
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            TelemetryPacket::Tracking(p) => Some(p.timestamp),
            TelemetryPacket::Hand(p) => Some(p.timestamp),
            TelemetryPacket::Face(p) => Some(p.timestamp),
            TelemetryPacket::Battery(_) => None,
        }
    }
}
