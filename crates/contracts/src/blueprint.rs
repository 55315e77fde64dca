//! StreamBlueprint - Config Loader output
//!
//! Describes one telemetry session: headset capabilities, scheduler tuning,
//! initial peer control, display cadence, simulation knobs and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{millis_to_nanos, Capability, ControlBit, SchedulerConfig, TrackingControl};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Headset capabilities
    pub headset: HeadsetConfig,

    /// Sampling scheduler tuning
    #[serde(default)]
    pub tracking: SchedulerConfig,

    /// Control applied before the peer sends its own
    #[serde(default)]
    pub control: ControlConfig,

    /// Display cadence
    #[serde(default)]
    pub display: DisplayConfig,

    /// Session endpoints
    #[serde(default)]
    pub session: SessionConfig,

    /// Simulated hardware behaviour
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Headset description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadsetConfig {
    /// Display name
    pub name: String,

    #[serde(default)]
    pub eye_gaze: bool,

    #[serde(default)]
    pub hand_tracking: bool,

    #[serde(default)]
    pub face_tracking: bool,

    #[serde(default)]
    pub battery: bool,
}

impl HeadsetConfig {
    /// Whether the configured headset has a capability
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::EyeGaze => self.eye_gaze,
            Capability::HandTracking => self.hand_tracking,
            Capability::FaceTracking => self.face_tracking,
            Capability::Battery => self.battery,
        }
    }
}

/// Initial tracking control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Enabled device classes
    #[serde(default = "default_enabled")]
    pub enabled: Vec<ControlBit>,

    /// Prediction offset (ms)
    #[serde(default)]
    pub offset_ms: f64,
}

fn default_enabled() -> Vec<ControlBit> {
    vec![
        ControlBit::LeftAim,
        ControlBit::LeftGrip,
        ControlBit::RightAim,
        ControlBit::RightGrip,
    ]
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            offset_ms: 0.0,
        }
    }
}

impl ControlConfig {
    /// Build the wire control message
    pub fn to_tracking_control(&self) -> TrackingControl {
        TrackingControl::with_enabled(&self.enabled, millis_to_nanos(self.offset_ms))
    }
}

/// Display cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Refresh rate (Hz), must be > 0
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate_hz: f64,

    /// Alternative to `refresh_rate_hz`; folded into it when loading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_period_ms: Option<f64>,
}

fn default_refresh_rate() -> f64 {
    90.0
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: default_refresh_rate(),
            frame_period_ms: None,
        }
    }
}

impl DisplayConfig {
    /// Frame period (ns)
    pub fn period(&self) -> crate::Nanos {
        crate::display::period_from_refresh_rate(self.refresh_rate_hz)
    }
}

/// Session endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// UDP address on which peer `TrackingControl` messages arrive
    #[serde(default)]
    pub control_addr: Option<String>,
}

/// Simulated hardware behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// How far ahead the pose runtime can predict (ms)
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: f64,

    /// How far back the pose runtime remembers (ms)
    #[serde(default = "default_lookbehind_ms")]
    pub lookbehind_ms: f64,

    /// Recenter trigger interval (s), 0 = never
    #[serde(default)]
    pub recenter_interval_s: f64,

    /// Simulated battery drain per poll (fraction)
    #[serde(default = "default_battery_drain")]
    pub battery_drain_per_poll: f32,
}

fn default_lookahead_ms() -> f64 {
    100.0
}

fn default_lookbehind_ms() -> f64 {
    50.0
}

fn default_battery_drain() -> f32 {
    0.001
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lookahead_ms: default_lookahead_ms(),
            lookbehind_ms: default_lookbehind_ms(),
            recenter_interval_s: 0.0,
            battery_drain_per_poll: default_battery_drain(),
        }
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    256
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON lines file
    File,
    /// UDP datagrams
    Network,
}

impl StreamBlueprint {
    /// Blueprint with defaults for everything but the headset
    pub fn with_headset(headset: HeadsetConfig) -> Self {
        Self {
            version: ConfigVersion::V1,
            headset,
            tracking: SchedulerConfig::default(),
            control: ControlConfig::default(),
            display: DisplayConfig::default(),
            session: SessionConfig::default(),
            simulation: SimulationConfig::default(),
            sinks: Vec::new(),
        }
    }
}
