//! 测试夹具：记录型 transport、可注入故障的位姿源、模拟头显组装

use std::sync::{Arc, Mutex};

use contracts::{
    Capabilities, Clock, DeviceId, DisplayTiming, HardwareError, HeadsetConfig, Nanos, Packet,
    PacketKind, PoseSource, SchedulerConfig, SpaceLocation, TelemetryPacket, Timestamp,
    TrackingControl, Transport, ViewSet, NANOS_PER_MILLI,
};
use device_sim::{
    ManualClock, SimulatedBattery, SimulatedCapabilities, SimulatedHeadset,
    SimulatedHeadsetConfig,
};
use tracking_engine::{Hardware, SamplingScheduler, StreamLifecycle, StreamShared};

pub const MS: Nanos = NANOS_PER_MILLI;
pub const START: Timestamp = 1_000 * MS;

/// Packets captured by a [`RecordingTransport`]
#[derive(Debug, Default, Clone)]
pub struct Recorded(Arc<Mutex<Vec<TelemetryPacket>>>);

impl Recorded {
    pub fn packets(&self) -> Vec<TelemetryPacket> {
        self.0.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<PacketKind> {
        self.packets().iter().map(TelemetryPacket::kind).collect()
    }

    pub fn count(&self, kind: PacketKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn tracking_offsets(&self, t0: Timestamp) -> Vec<Nanos> {
        self.packets()
            .into_iter()
            .filter_map(|p| match p {
                TelemetryPacket::Tracking(t) if t.production_timestamp == t0 => {
                    Some(t.timestamp - t0)
                }
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Keeps every packet; each send costs `cost` on the manual clock.
///
/// With `exit_after` set, requests a stream exit once that many packets went
/// through, so `SamplingScheduler::run` terminates on its own.
pub struct RecordingTransport {
    pub clock: Arc<ManualClock>,
    pub recorded: Recorded,
    pub cost: Nanos,
    pub exit_after: Option<(usize, Arc<StreamLifecycle>)>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, packet: Packet<'_>) {
        let sent = {
            let mut packets = self.recorded.0.lock().unwrap();
            packets.push(packet.to_owned_packet());
            packets.len()
        };
        self.clock.advance(self.cost);
        if let Some((limit, lifecycle)) = &self.exit_after {
            if sent >= *limit {
                lifecycle.request_exit();
            }
        }
    }
}

/// Pose source that loses the session on the n-th view query
pub struct FailingPoses {
    pub inner: SimulatedHeadset,
    pub fail_on_call: usize,
    pub calls: usize,
}

impl PoseSource for FailingPoses {
    fn locate_views(&mut self, at: Timestamp) -> Result<ViewSet, HardwareError> {
        self.calls += 1;
        if self.calls == self.fail_on_call {
            return Err(HardwareError::SessionLost);
        }
        self.inner.locate_views(at)
    }

    fn locate(&mut self, device: DeviceId, at: Timestamp) -> Result<SpaceLocation, HardwareError> {
        self.inner.locate(device, at)
    }
}

pub fn full_headset() -> HeadsetConfig {
    HeadsetConfig {
        name: "sim-headset".into(),
        eye_gaze: true,
        hand_tracking: true,
        face_tracking: true,
        battery: true,
    }
}

/// Everything a scenario needs to drive and inspect one scheduler
pub struct Rig {
    pub clock: Arc<ManualClock>,
    pub headset: SimulatedHeadset,
    pub capabilities: Arc<SimulatedCapabilities>,
    pub shared: StreamShared,
    pub recorded: Recorded,
    pub scheduler: SamplingScheduler,
}

pub struct RigOptions {
    pub control: TrackingControl,
    pub display_period: Nanos,
    pub headset: SimulatedHeadsetConfig,
    pub send_cost: Nanos,
    pub battery_drain: f32,
    pub exit_after: Option<usize>,
    /// Lose the session on this view query
    pub fail_views_on: Option<usize>,
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            control: TrackingControl::default(),
            display_period: 10 * MS,
            headset: SimulatedHeadsetConfig::default(),
            send_cost: 0,
            battery_drain: 0.1,
            exit_after: None,
            fail_views_on: None,
        }
    }
}

impl Rig {
    pub fn new(options: RigOptions) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let headset = SimulatedHeadset::new(Arc::clone(&dyn_clock), options.headset);
        let capabilities = Arc::new(SimulatedCapabilities::from_headset(&full_headset()));
        let shared = StreamShared::new(options.control, DisplayTiming::new(options.display_period));
        let recorded = Recorded::default();

        let poses: Box<dyn PoseSource> = match options.fail_views_on {
            Some(n) => Box::new(FailingPoses {
                inner: headset.clone(),
                fail_on_call: n,
                calls: 0,
            }),
            None => Box::new(headset.clone()),
        };
        let hardware = Hardware {
            poses,
            hands: Some(Box::new(headset.clone())),
            face: Some(Box::new(headset.clone())),
            battery: Some(Box::new(SimulatedBattery::new(1.0, options.battery_drain))),
            capabilities: capabilities.clone() as Arc<dyn Capabilities>,
        };
        let transport = RecordingTransport {
            clock: Arc::clone(&clock),
            recorded: recorded.clone(),
            cost: options.send_cost,
            exit_after: options
                .exit_after
                .map(|limit| (limit, Arc::clone(&shared.lifecycle))),
        };
        let scheduler = SamplingScheduler::new(
            &SchedulerConfig::default(),
            dyn_clock,
            hardware,
            Box::new(transport),
            shared.clone(),
        );

        Self {
            clock,
            headset,
            capabilities,
            shared,
            recorded,
            scheduler,
        }
    }
}
