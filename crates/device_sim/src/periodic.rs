//! Background tickers: simulated display vsync and periodic recenter.
//!
//! Each runs on its own named thread and stops when the handle is stopped or
//! dropped.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use contracts::{Clock, DisplayTiming, Nanos, Timestamp, NANOS_PER_MILLI};
use tracing::{debug, trace};

/// Longest single sleep, so stop requests are noticed promptly
const MAX_SLICE: Nanos = 20 * NANOS_PER_MILLI;

/// Handle to a thread that calls `tick` every `interval`
pub struct PeriodicTask {
    name: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn the ticker; the first tick happens immediately
    pub fn spawn<F>(
        name: impl Into<String>,
        clock: Arc<dyn Clock>,
        interval: Nanos,
        mut tick: F,
    ) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let name = name.into();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let thread_name = name.clone();
        let interval = interval.max(1);

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            debug!(task = %thread_name, interval_ns = interval, "periodic task started");
            while thread_running.load(Ordering::Relaxed) {
                tick();
                let mut remaining = interval;
                while remaining > 0 && thread_running.load(Ordering::Relaxed) {
                    let slice = remaining.min(MAX_SLICE);
                    clock.sleep(slice);
                    remaining -= slice;
                }
            }
            debug!(task = %thread_name, "periodic task stopped");
        })?;

        Ok(Self {
            name,
            running,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop and join the thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(task = %self.name, "periodic task panicked");
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// First vsync strictly after `now` on the grid `k * period + offset`
pub fn next_vsync(now: Timestamp, period: Nanos, offset: Nanos) -> Timestamp {
    if period <= 0 {
        return now;
    }
    let since = (now - offset).rem_euclid(period);
    now - since + period
}

/// Simulated render loop publishing display timing once per frame.
///
/// The predicted display time is one frame after the next vsync.
pub fn spawn_display(
    clock: Arc<dyn Clock>,
    timing: Arc<DisplayTiming>,
    period: Nanos,
    vsync_offset: Nanos,
) -> io::Result<PeriodicTask> {
    let tick_clock = Arc::clone(&clock);
    PeriodicTask::spawn("display-sim", clock, period, move || {
        let predicted = next_vsync(tick_clock.now(), period, vsync_offset) + period;
        timing.observe(predicted, period);
        trace!(predicted, period, "display frame");
    })
}

/// Fires `trigger` every `interval`, skipping the immediate first tick
pub fn spawn_recenter<F>(
    clock: Arc<dyn Clock>,
    interval: Nanos,
    mut trigger: F,
) -> io::Result<PeriodicTask>
where
    F: FnMut() + Send + 'static,
{
    let mut first = true;
    PeriodicTask::spawn("recenter-sim", clock, interval, move || {
        if std::mem::take(&mut first) {
            return;
        }
        debug!("simulated recenter");
        trigger();
    })
}
