//! Device gating: which sources the peer enabled and the platform offers.

use contracts::{Capabilities, Capability, ControlBit, DeviceId, TrackingControl};

/// Something the scheduler may report on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Device(DeviceId),
    Battery,
}

impl From<DeviceId> for Source {
    fn from(device: DeviceId) -> Self {
        Source::Device(device)
    }
}

/// Devices reported inside the tracking packet, in packet order
pub const POSE_DEVICES: [DeviceId; 6] = [
    DeviceId::Head,
    DeviceId::LeftAim,
    DeviceId::LeftGrip,
    DeviceId::RightAim,
    DeviceId::RightGrip,
    DeviceId::EyeGaze,
];

/// Control bit gating a source; `None` means always on
pub fn control_bit(source: Source) -> Option<ControlBit> {
    match source {
        Source::Device(DeviceId::Head) | Source::Device(DeviceId::EyeGaze) => None,
        Source::Device(DeviceId::LeftAim) => Some(ControlBit::LeftAim),
        Source::Device(DeviceId::LeftGrip) => Some(ControlBit::LeftGrip),
        Source::Device(DeviceId::RightAim) => Some(ControlBit::RightAim),
        Source::Device(DeviceId::RightGrip) => Some(ControlBit::RightGrip),
        Source::Device(DeviceId::LeftHand) => Some(ControlBit::LeftHand),
        Source::Device(DeviceId::RightHand) => Some(ControlBit::RightHand),
        Source::Device(DeviceId::Face) => Some(ControlBit::Face),
        Source::Battery => Some(ControlBit::Battery),
    }
}

/// Whether the peer wants this source
pub fn enabled(control: &TrackingControl, source: impl Into<Source>) -> bool {
    control_bit(source.into()).is_none_or(|bit| control.is_enabled(bit))
}

/// Platform capability a source needs; `None` means always present
pub fn required_capability(source: Source) -> Option<Capability> {
    match source {
        Source::Device(DeviceId::EyeGaze) => Some(Capability::EyeGaze),
        Source::Device(DeviceId::LeftHand) | Source::Device(DeviceId::RightHand) => {
            Some(Capability::HandTracking)
        }
        Source::Device(DeviceId::Face) => Some(Capability::FaceTracking),
        Source::Battery => Some(Capability::Battery),
        Source::Device(
            DeviceId::Head
            | DeviceId::LeftAim
            | DeviceId::LeftGrip
            | DeviceId::RightAim
            | DeviceId::RightGrip,
        ) => None,
    }
}

/// Whether the platform currently offers this source
pub fn available(capabilities: &dyn Capabilities, source: impl Into<Source>) -> bool {
    required_capability(source.into()).is_none_or(|cap| capabilities.supports(cap))
}

/// Enabled and available
pub fn active(
    control: &TrackingControl,
    capabilities: &dyn Capabilities,
    source: impl Into<Source> + Copy,
) -> bool {
    enabled(control, source) && available(capabilities, source)
}

/// Pose devices to query for one burst
pub fn pose_devices(control: &TrackingControl, capabilities: &dyn Capabilities) -> Vec<DeviceId> {
    POSE_DEVICES
        .into_iter()
        .filter(|device| active(control, capabilities, *device))
        .collect()
}
