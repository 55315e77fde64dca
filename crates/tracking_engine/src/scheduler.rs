//! Sampling scheduler.
//!
//! One iteration: sleep until shortly before `t0`, snapshot the peer control,
//! sample the prediction window, adapt the sampling rate, poll the battery
//! when due, then advance `t0` by the sampling period.
//!
//! Runs on a dedicated thread; every hardware call is synchronous.

use std::sync::Arc;

use contracts::{
    BatteryProvider, BurstReport, Capabilities, Clock, DeviceId, DisplayTiming, FaceTracker,
    FaceTrackingPacket, HandSide, HandTracker, HandTrackingPacket, Nanos, Packet, PoseSource,
    SchedulerConfig, SchedulerReport, StateFlags, Timestamp, TrackingControl, TrackingPacket,
    Transport,
};
use observability::{TelemetryAggregator, TelemetrySummary};
use tracing::{debug, error, info, instrument, trace};

use crate::control::SharedControlState;
use crate::encode;
use crate::error::SchedulerError;
use crate::gating::{self, Source};
use crate::lifecycle::StreamLifecycle;
use crate::rate::RateController;
use crate::recenter::RecenterLatch;
use crate::stopwatch::BusyTimer;
use crate::window::PredictionWindow;

/// Hardware collaborators the scheduler samples
pub struct Hardware {
    pub poses: Box<dyn PoseSource>,
    pub hands: Option<Box<dyn HandTracker>>,
    pub face: Option<Box<dyn FaceTracker>>,
    pub battery: Option<Box<dyn BatteryProvider>>,
    pub capabilities: Arc<dyn Capabilities>,
}

/// State shared between the scheduler thread and the rest of the session
#[derive(Debug, Clone, Default)]
pub struct StreamShared {
    pub control: Arc<SharedControlState>,
    pub recenter: Arc<RecenterLatch>,
    pub display: Arc<DisplayTiming>,
    pub lifecycle: Arc<StreamLifecycle>,
}

impl StreamShared {
    pub fn new(control: TrackingControl, display: DisplayTiming) -> Self {
        Self {
            control: Arc::new(SharedControlState::new(control)),
            recenter: Arc::new(RecenterLatch::new()),
            display: Arc::new(display),
            lifecycle: Arc::new(StreamLifecycle::new()),
        }
    }
}

/// Result of a scheduler run that ended on an exit request
#[derive(Debug, Clone)]
pub struct SchedulerRun {
    pub report: SchedulerReport,
    pub summary: TelemetrySummary,
}

/// Transport wrapper that times every send
struct Emitter {
    transport: Box<dyn Transport>,
    busy: BusyTimer,
    burst_packets: usize,
}

impl Emitter {
    fn begin_burst(&mut self) {
        self.busy.reset();
        self.burst_packets = 0;
    }

    fn emit(&mut self, packet: Packet<'_>) {
        self.busy.resume();
        self.transport.send(packet);
        self.busy.pause();
        self.burst_packets += 1;
        observability::record_packet_sent(packet.kind());
    }

    /// Send outside the busy measurement
    fn emit_untimed(&mut self, packet: Packet<'_>) {
        self.transport.send(packet);
        observability::record_packet_sent(packet.kind());
    }
}

pub struct SamplingScheduler {
    clock: Arc<dyn Clock>,
    hardware: Hardware,
    shared: StreamShared,
    emitter: Emitter,
    rate: RateController,
    wake_lead: Nanos,
    battery_interval: Nanos,
    /// Target instant of the next burst
    t0: Timestamp,
    next_battery_check: Option<Timestamp>,
    /// Reused between samples
    packet: TrackingPacket,
    report: SchedulerReport,
    aggregator: TelemetryAggregator,
}

impl SamplingScheduler {
    pub fn new(
        config: &SchedulerConfig,
        clock: Arc<dyn Clock>,
        hardware: Hardware,
        transport: Box<dyn Transport>,
        shared: StreamShared,
    ) -> Self {
        let t0 = clock.now();
        let emitter = Emitter {
            transport,
            busy: BusyTimer::paused(Arc::clone(&clock)),
            burst_packets: 0,
        };
        Self {
            clock,
            hardware,
            shared,
            emitter,
            rate: RateController::new(config.initial_period()),
            wake_lead: config.wake_lead(),
            battery_interval: config.battery_interval(),
            t0,
            next_battery_check: None,
            packet: TrackingPacket::default(),
            report: SchedulerReport::default(),
            aggregator: TelemetryAggregator::new(),
        }
    }

    /// Target instant of the next burst
    pub fn t0(&self) -> Timestamp {
        self.t0
    }

    /// Current sampling period
    pub fn period(&self) -> Nanos {
        self.rate.period()
    }

    pub fn skip_samples(&self) -> u32 {
        self.rate.skip_samples()
    }

    pub fn report(&self) -> &SchedulerReport {
        &self.report
    }

    /// Loop until an exit is requested or a hardware call fails.
    ///
    /// On failure the lifecycle is asked to tear the session down before the
    /// error is returned.
    #[instrument(name = "sampling_scheduler_run", skip(self), fields(t0 = self.t0))]
    pub fn run(mut self) -> Result<SchedulerRun, SchedulerError> {
        info!(period_ns = self.rate.period(), "sampling scheduler started");

        loop {
            match self.step() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "sampling scheduler stopped");
                    self.shared.lifecycle.request_teardown(e.to_string());
                    return Err(e);
                }
            }
        }

        info!(
            iterations = self.report.iterations,
            samples = self.report.samples,
            packets = self.report.packets,
            "sampling scheduler exited"
        );

        Ok(SchedulerRun {
            summary: self.aggregator.summary(),
            report: self.report,
        })
    }

    /// One full iteration; `Ok(None)` once an exit was requested
    pub fn step(&mut self) -> Result<Option<BurstReport>, SchedulerError> {
        let now = self.sleep_until_target();
        if self.shared.lifecycle.is_exiting() {
            return Ok(None);
        }

        let control = self.shared.control.snapshot();
        let mut burst = self.burst(&control)?;

        self.rate.update(burst.busy, burst.samples);
        burst.next_period = self.rate.period();
        burst.skip_samples = self.rate.skip_samples();

        self.poll_battery(&control, now);

        self.report.record(&burst);
        self.aggregator.update(&burst);
        observability::record_burst_metrics(&burst);
        trace!(
            t0 = burst.t0,
            samples = burst.samples,
            busy_ns = burst.busy,
            period_ns = burst.next_period,
            "burst complete"
        );

        self.t0 += self.rate.period();
        Ok(Some(burst))
    }

    /// Sleep until `wake_lead` before `t0`, then clamp `t0` to the time read
    /// before sleeping. Returns that time.
    fn sleep_until_target(&mut self) -> Timestamp {
        let now = self.clock.now();
        if now < self.t0 {
            let wait = self.t0 - now - self.wake_lead;
            if wait > 0 {
                self.clock.sleep(wait);
            }
        }
        self.t0 = self.t0.max(now);
        now
    }

    fn burst(&mut self, control: &TrackingControl) -> Result<BurstReport, SchedulerError> {
        let t0 = self.t0;
        let mut window = PredictionWindow::new(control.offset, self.shared.display.period());
        let devices = gating::pose_devices(control, &*self.hardware.capabilities);

        let mut burst = BurstReport {
            t0,
            prediction: window.prediction(),
            ..Default::default()
        };
        self.emitter.begin_burst();

        while let Some(dt) = window.next() {
            burst.samples += 1;
            let at = t0 + dt;
            let emitted = burst.emitted;
            match self.sample(control, &devices, at, &mut burst) {
                Ok(()) => {}
                // 追踪包已发出则该采样仍计为 emitted
                Err(e) if e.is_time_out_of_window() => {
                    if burst.emitted == emitted {
                        burst.out_of_window += 1;
                    }
                    trace!(at, "prediction outside runtime window");
                }
                Err(e) => return Err(SchedulerError::hardware(at, e)),
            }

            if let Some(shifted) = window.align_to_display(
                self.shared.display.phase(),
                t0,
                self.rate.skip_samples(),
            ) {
                trace!(dt = shifted, "window aligned to display phase");
            }
        }

        burst.busy = self.emitter.busy.elapsed();
        burst.packets = self.emitter.burst_packets;
        Ok(burst)
    }

    /// Query and send every packet for one predicted instant.
    ///
    /// Order: tracking, left hand, right hand, face. The sample counts as
    /// emitted as soon as its tracking packet is sent.
    fn sample(
        &mut self,
        control: &TrackingControl,
        devices: &[DeviceId],
        at: Timestamp,
        burst: &mut BurstReport,
    ) -> Result<(), contracts::HardwareError> {
        let views = self.hardware.poses.locate_views(at)?;

        self.packet.production_timestamp = self.t0;
        self.packet.timestamp = at;
        self.packet.views = views.views;
        self.packet.view_flags = views.flags;
        self.packet.device_poses.clear();
        for &device in devices {
            let location = self.hardware.poses.locate(device, at)?;
            self.packet
                .device_poses
                .push(encode::pose_sample(device, &location));
        }

        // Taken only once the packet is complete so a failed sample keeps it.
        let recentered = self.shared.recenter.take();
        self.packet.state_flags = if recentered {
            debug!(at, "reference space recentered");
            StateFlags::RECENTERED
        } else {
            StateFlags::empty()
        };
        burst.recentered |= recentered;
        self.emitter.emit(Packet::Tracking(&self.packet));
        burst.emitted += 1;

        let capabilities = &*self.hardware.capabilities;
        if let Some(hands) = self.hardware.hands.as_mut() {
            for (side, device) in [
                (HandSide::Left, DeviceId::LeftHand),
                (HandSide::Right, DeviceId::RightHand),
            ] {
                if !gating::active(control, capabilities, device) {
                    continue;
                }
                let joints = hands.locate_hand(side, at)?;
                let packet = HandTrackingPacket {
                    hand: side,
                    production_timestamp: self.t0,
                    timestamp: at,
                    joints: joints.as_ref().map(encode::hand_joints),
                };
                self.emitter.emit(Packet::Hand(&packet));
            }
        }

        if let Some(face) = self.hardware.face.as_mut() {
            if gating::active(control, capabilities, DeviceId::Face) {
                let packet = FaceTrackingPacket {
                    production_timestamp: self.t0,
                    timestamp: at,
                    weights: face.weights(at)?,
                };
                self.emitter.emit(Packet::Face(&packet));
            }
        }

        Ok(())
    }

    fn poll_battery(&mut self, control: &TrackingControl, now: Timestamp) {
        if self.next_battery_check.is_some_and(|next| now <= next) {
            return;
        }
        if !gating::active(control, &*self.hardware.capabilities, Source::Battery) {
            return;
        }
        let Some(provider) = self.hardware.battery.as_mut() else {
            return;
        };

        let timer = BusyTimer::running(Arc::clone(&self.clock));
        let battery = provider.poll();
        self.emitter.emit_untimed(Packet::Battery(&battery));
        self.next_battery_check = Some(now + self.battery_interval);
        let took = timer.elapsed();

        self.report.battery_polls += 1;
        observability::record_battery_poll(&battery, took);
        info!(
            took_us = took / 1_000,
            present = battery.present,
            charge = battery.charge,
            charging = battery.charging,
            "battery check took {}µs",
            took / 1_000
        );
    }
}
