//! ChannelTransport - bridges the sampling thread to the async dispatcher

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{trace, warn};

use contracts::{Packet, TelemetryPacket, Transport};

/// Fire-and-forget [`Transport`] over a bounded tokio channel
///
/// `send` never blocks the scheduler: a full channel drops the packet and
/// counts it. Packets that get through keep their send order.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<TelemetryPacket>,
    dropped: Arc<AtomicU64>,
    closed_logged: bool,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<TelemetryPacket>) -> Self {
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            closed_logged: false,
        }
    }

    /// Transport plus the receiving end for a [`crate::Dispatcher`]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TelemetryPacket>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Shared drop counter, readable after the transport moved to the scheduler
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, packet: Packet<'_>) {
        let kind = packet.kind();
        match self.tx.try_send(packet.to_owned_packet()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                observability::record_packet_dropped(kind);
                trace!(%kind, "transport channel full, packet dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                observability::record_packet_dropped(kind);
                if !std::mem::replace(&mut self.closed_logged, true) {
                    warn!("transport channel closed, dropping packets");
                }
            }
        }
    }
}
