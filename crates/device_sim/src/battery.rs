//! Simulated battery and platform capabilities.

use std::sync::atomic::{AtomicBool, Ordering};

use contracts::{BatteryPacket, BatteryProvider, Capabilities, Capability, HeadsetConfig};
use tracing::debug;

/// Charge at which the simulated user plugs the headset in
const PLUG_IN_AT: f32 = 0.2;
/// Charging is this many times faster than draining
const CHARGE_FACTOR: f32 = 5.0;

/// Battery that drains per poll and recharges once low
#[derive(Debug, Clone)]
pub struct SimulatedBattery {
    charge: f32,
    drain_per_poll: f32,
    charging: bool,
}

impl SimulatedBattery {
    pub fn new(charge: f32, drain_per_poll: f32) -> Self {
        Self {
            charge: charge.clamp(0.0, 1.0),
            drain_per_poll,
            charging: false,
        }
    }
}

impl BatteryProvider for SimulatedBattery {
    fn poll(&mut self) -> BatteryPacket {
        if self.charging {
            self.charge = (self.charge + self.drain_per_poll * CHARGE_FACTOR).min(1.0);
            if self.charge >= 1.0 {
                self.charging = false;
                debug!("simulated battery full, unplugged");
            }
        } else {
            self.charge = (self.charge - self.drain_per_poll).max(0.0);
            if self.charge <= PLUG_IN_AT {
                self.charging = true;
                debug!(charge = self.charge, "simulated battery low, plugged in");
            }
        }
        BatteryPacket {
            present: true,
            charge: self.charge,
            charging: self.charging,
        }
    }
}

/// Capability switches, adjustable while a session runs
#[derive(Debug, Default)]
pub struct SimulatedCapabilities {
    eye_gaze: AtomicBool,
    hand_tracking: AtomicBool,
    face_tracking: AtomicBool,
    battery: AtomicBool,
}

impl SimulatedCapabilities {
    pub fn from_headset(headset: &HeadsetConfig) -> Self {
        let caps = Self::default();
        for capability in [
            Capability::EyeGaze,
            Capability::HandTracking,
            Capability::FaceTracking,
            Capability::Battery,
        ] {
            caps.set(capability, headset.supports(capability));
        }
        caps
    }

    pub fn set(&self, capability: Capability, supported: bool) {
        self.flag(capability).store(supported, Ordering::Relaxed);
    }

    fn flag(&self, capability: Capability) -> &AtomicBool {
        match capability {
            Capability::EyeGaze => &self.eye_gaze,
            Capability::HandTracking => &self.hand_tracking,
            Capability::FaceTracking => &self.face_tracking,
            Capability::Battery => &self.battery,
        }
    }
}

impl Capabilities for SimulatedCapabilities {
    fn supports(&self, capability: Capability) -> bool {
        self.flag(capability).load(Ordering::Relaxed)
    }
}
