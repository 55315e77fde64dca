//! SinkHandle - one sink behind its own bounded queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use contracts::{PacketSink, TelemetryPacket};

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<TelemetryPacket>,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task; must be called inside a tokio runtime
    pub fn spawn<S: PacketSink + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker = tokio::spawn(sink_worker(sink, rx, Arc::clone(&metrics), name.clone()));

        Self {
            name,
            tx,
            metrics,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a packet without waiting
    ///
    /// Returns false when the packet was dropped (queue full or worker gone).
    pub fn try_send(&self, packet: TelemetryPacket) -> bool {
        match self.tx.try_send(packet) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(p)) => {
                self.metrics.record_dropped();
                trace!(sink = %self.name, kind = %p.kind(), "queue full, packet dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Close the queue and wait for the worker to drain it
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!(sink = %self.name, error = ?e, "sink worker panicked");
        }
        let snap = self.metrics.snapshot();
        if snap.dropped > 0 {
            warn!(sink = %self.name, dropped = snap.dropped, "sink dropped packets");
        }
        debug!(sink = %self.name, %snap, "sink shutdown complete");
    }
}

#[instrument(name = "sink_worker_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn sink_worker<S: PacketSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<TelemetryPacket>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!("sink worker started");

    while let Some(packet) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&packet).await {
            Ok(()) => metrics.record_write(&name, true),
            Err(e) => {
                metrics.record_write(&name, false);
                // 单个包失败不影响后续写入
                error!(kind = %packet.kind(), error = %e, "write failed");
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "close failed on shutdown");
    }

    debug!("sink worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BatteryPacket, ContractError, PacketKind};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};

    struct MockSink {
        name: String,
        written: Arc<Mutex<Vec<PacketKind>>>,
        closed: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockSink {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                written: Arc::default(),
                closed: Arc::default(),
                should_fail: false,
                delay_ms: 0,
            }
        }
    }

    impl PacketSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, packet: &TelemetryPacket) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.written.lock().unwrap().push(packet.kind());
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.closed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn battery(charge: f32) -> TelemetryPacket {
        TelemetryPacket::Battery(BatteryPacket {
            present: true,
            charge,
            charging: false,
        })
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let sink = MockSink::new("test");
        let written = Arc::clone(&sink.written);
        let closed = Arc::clone(&sink.closed);

        let handle = SinkHandle::spawn(sink, 10);
        for i in 0..5 {
            assert!(handle.try_send(battery(i as f32 / 10.0)));
        }
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;

        assert_eq!(written.lock().unwrap().len(), 5);
        assert_eq!(metrics.written(), 5);
        assert_eq!(closed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_sink_handle_queue_full() {
        let mut sink = MockSink::new("slow");
        sink.delay_ms = 100;

        let handle = SinkHandle::spawn(sink, 2);
        let accepted = (0..10).filter(|_| handle.try_send(battery(0.5))).count();

        assert!(accepted < 10);
        assert_eq!(handle.metrics().dropped(), (10 - accepted) as u64);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let mut sink = MockSink::new("failing");
        sink.should_fail = true;

        let handle = SinkHandle::spawn(sink, 10);
        for _ in 0..3 {
            handle.try_send(battery(0.5));
        }
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;

        assert_eq!(metrics.failed(), 3);
        assert_eq!(metrics.written(), 0);
    }
}
