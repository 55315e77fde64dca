//! Session orchestrator - wires simulated hardware, scheduler and sinks.
//!
//! Threads and tasks:
//! - `sampling-scheduler`: dedicated std thread running the scheduler loop
//! - `display-sim` / `recenter-sim`: periodic simulator threads
//! - tokio tasks: dispatcher, sink workers, control listener

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{millis_to_nanos, Clock, DisplayTiming, StreamBlueprint, NANOS_PER_MILLI};
use device_sim::{
    spawn_display, spawn_recenter, MonotonicClock, PeriodicTask, SimulatedBattery,
    SimulatedCapabilities, SimulatedHeadset, SimulatedHeadsetConfig,
};
use dispatcher::ChannelTransport;
use tracing::{info, instrument, warn};
use tracking_engine::{Hardware, SamplingScheduler, StreamLifecycle, StreamShared};

use super::{ControlListener, SessionStats};
use crate::error::CliError;

/// How often the orchestrator checks for a teardown requested elsewhere
const LIFECYCLE_POLL: Duration = Duration::from_millis(50);
/// Upper bound on waiting for sinks to drain
const DISPATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
/// Battery level the simulated headset starts at
const INITIAL_CHARGE: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub blueprint: StreamBlueprint,
    /// Stop after this long (None = until shutdown signal)
    pub duration: Option<Duration>,
    /// Scheduler-to-dispatcher channel capacity
    pub buffer_size: usize,
    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// One telemetry session against the simulated headset
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves, the duration elapses or sampling fails.
    ///
    /// Every component is stopped and drained before returning. A sampling
    /// failure is returned as an error after cleanup.
    #[instrument(name = "session_run", skip_all, fields(headset = %self.config.blueprint.headset.name))]
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<SessionStats> {
        let started = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
        let shared = StreamShared::new(
            blueprint.control.to_tracking_control(),
            DisplayTiming::from_refresh_rate(blueprint.display.refresh_rate_hz),
        );

        // Output side first, so the scheduler never sends into nothing
        let (transport, packet_rx) = ChannelTransport::channel(self.config.buffer_size);
        let transport_dropped = transport.dropped_counter();
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - packets will be discarded");
        }
        let dispatcher_task = dispatcher::create_dispatcher(blueprint.sinks.clone(), packet_rx)
            .await
            .context("Failed to create dispatcher")?
            .spawn();

        let mut simulators = spawn_simulators(blueprint, &clock, &shared)?;

        let listener = match &blueprint.session.control_addr {
            Some(addr) => Some(ControlListener::bind(addr, Arc::clone(&shared.control)).await?),
            None => None,
        };

        let scheduler = SamplingScheduler::new(
            &blueprint.tracking,
            Arc::clone(&clock),
            build_hardware(blueprint, &clock),
            Box::new(transport),
            shared.clone(),
        );
        let scheduler_thread = thread::Builder::new()
            .name("sampling-scheduler".into())
            .spawn(move || scheduler.run())
            .map_err(CliError::Io)?;

        info!(
            refresh_hz = blueprint.display.refresh_rate_hz,
            sinks = blueprint.sinks.len(),
            control = ?listener.as_ref().map(ControlListener::local_addr),
            "Session running"
        );

        wait_for_stop(shutdown, self.config.duration, &shared.lifecycle).await;
        shared.lifecycle.request_exit();

        // 调度线程退出后 transport 被释放，分发器随之排空
        let outcome = tokio::task::spawn_blocking(move || scheduler_thread.join())
            .await
            .context("Failed to join sampling thread")?;

        if let Some(listener) = listener {
            listener.stop();
        }
        for task in &mut simulators {
            task.stop();
        }

        let sinks = match tokio::time::timeout(DISPATCHER_DRAIN_TIMEOUT, dispatcher_task).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(error = %e, "Dispatcher task failed");
                Vec::new()
            }
            Err(_) => {
                warn!("Timed out waiting for sinks to drain");
                Vec::new()
            }
        };

        let mut stats = SessionStats {
            duration: started.elapsed(),
            run: None,
            transport_dropped: transport_dropped.load(Ordering::Relaxed),
            sinks,
            teardown_reason: shared.lifecycle.teardown_reason(),
        };

        match outcome {
            Ok(Ok(run)) => {
                stats.run = Some(run);
                info!(
                    duration_secs = stats.duration.as_secs_f64(),
                    "Session shutdown complete"
                );
                Ok(stats)
            }
            Ok(Err(e)) => Err(CliError::from(e).into()),
            Err(_) => Err(CliError::SchedulerPanicked.into()),
        }
    }
}

/// Simulated headset wired as the scheduler's hardware
fn build_hardware(blueprint: &StreamBlueprint, clock: &Arc<dyn Clock>) -> Hardware {
    let headset = SimulatedHeadset::new(
        Arc::clone(clock),
        SimulatedHeadsetConfig::from(&blueprint.simulation),
    );
    let headset_config = &blueprint.headset;

    Hardware {
        poses: Box::new(headset.clone()),
        hands: headset_config
            .hand_tracking
            .then(|| Box::new(headset.clone()) as Box<dyn contracts::HandTracker>),
        face: headset_config
            .face_tracking
            .then(|| Box::new(headset.clone()) as Box<dyn contracts::FaceTracker>),
        battery: headset_config.battery.then(|| {
            Box::new(SimulatedBattery::new(
                INITIAL_CHARGE,
                blueprint.simulation.battery_drain_per_poll,
            )) as Box<dyn contracts::BatteryProvider>
        }),
        capabilities: Arc::new(SimulatedCapabilities::from_headset(headset_config)),
    }
}

/// Display vsync publisher, plus the recenter trigger when configured
fn spawn_simulators(
    blueprint: &StreamBlueprint,
    clock: &Arc<dyn Clock>,
    shared: &StreamShared,
) -> Result<Vec<PeriodicTask>> {
    let mut tasks = Vec::with_capacity(2);

    let period = blueprint.display.period().max(NANOS_PER_MILLI);
    tasks.push(
        spawn_display(Arc::clone(clock), Arc::clone(&shared.display), period, 0)
            .context("Failed to start display simulator")?,
    );

    let interval_s = blueprint.simulation.recenter_interval_s;
    if interval_s > 0.0 {
        let latch = Arc::clone(&shared.recenter);
        tasks.push(
            spawn_recenter(
                Arc::clone(clock),
                millis_to_nanos(interval_s * 1000.0),
                move || latch.trigger(),
            )
            .context("Failed to start recenter trigger")?,
        );
    }

    Ok(tasks)
}

/// Resolve on the first of: shutdown signal, duration elapsed, lifecycle exit
async fn wait_for_stop(
    shutdown: impl Future<Output = ()>,
    duration: Option<Duration>,
    lifecycle: &StreamLifecycle,
) {
    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };

    let exiting = async {
        let mut tick = tokio::time::interval(LIFECYCLE_POLL);
        while !lifecycle.is_exiting() {
            tick.tick().await;
        }
    };

    tokio::select! {
        _ = shutdown => warn!("Received shutdown signal, stopping session..."),
        _ = deadline => info!("Session duration reached"),
        _ = exiting => warn!(reason = ?lifecycle.teardown_reason(), "Session exit requested"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{HeadsetConfig, SinkConfig, SinkType};
    use std::collections::HashMap;

    fn blueprint() -> StreamBlueprint {
        let mut bp = StreamBlueprint::with_headset(HeadsetConfig {
            name: "test-headset".into(),
            eye_gaze: true,
            hand_tracking: true,
            face_tracking: true,
            battery: true,
        });
        bp.sinks.push(SinkConfig {
            name: "log".into(),
            sink_type: SinkType::Log,
            queue_capacity: 4096,
            params: HashMap::new(),
        });
        bp
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_session_runs_for_duration() {
        let session = Session::new(SessionConfig {
            blueprint: blueprint(),
            duration: Some(Duration::from_millis(200)),
            buffer_size: 4096,
            metrics_port: None,
        });

        let stats = session.run(std::future::pending()).await.unwrap();
        let run = stats.run.expect("scheduler report");
        assert!(run.report.iterations > 0);
        assert!(run.report.packets > 0);
        assert!(stats.teardown_reason.is_none());
        assert_eq!(stats.sinks.len(), 1);
        assert!(stats.sinks[0].1.written > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_session_stops_on_shutdown_signal() {
        let session = Session::new(SessionConfig {
            blueprint: blueprint(),
            duration: None,
            buffer_size: 1024,
            metrics_port: None,
        });

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        let stats = session.run(shutdown).await.unwrap();
        assert!(stats.run.is_some());
        assert!(stats.duration >= Duration::from_millis(100));
    }
}
