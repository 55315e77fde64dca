//! Peer control listener - JSON `TrackingControl` messages over UDP

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{ControlConfig, TrackingControl};
use serde::Deserialize;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use tracking_engine::SharedControlState;

/// Largest control datagram accepted
const MAX_MESSAGE: usize = 4096;

/// Accepted message shapes
///
/// - wire form: `{"enabled": [bool; 8], "offset_ns": i64}`
/// - config form: `{"enabled": ["left_aim", ...], "offset_ms": f64}`
#[derive(Deserialize)]
#[serde(untagged)]
enum ControlMessage {
    Wire(TrackingControl),
    Config(ControlConfig),
}

/// Decode one control datagram
pub fn parse_control(bytes: &[u8]) -> Result<TrackingControl, serde_json::Error> {
    let message: ControlMessage = serde_json::from_slice(bytes)?;
    Ok(match message {
        ControlMessage::Wire(control) => control,
        ControlMessage::Config(config) => config.to_tracking_control(),
    })
}

/// Background task applying peer control messages to the shared state
pub struct ControlListener {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ControlListener {
    #[instrument(name = "control_listener_bind", skip(control))]
    pub async fn bind(addr: &str, control: Arc<SharedControlState>) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("Failed to bind control socket on {addr}"))?;
        let local_addr = socket.local_addr()?;
        info!(addr = %local_addr, "control listener ready");

        let task = tokio::spawn(serve(socket, control));
        Ok(Self { local_addr, task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stop(self) {
        self.task.abort();
        debug!(addr = %self.local_addr, "control listener stopped");
    }
}

async fn serve(socket: UdpSocket, control: Arc<SharedControlState>) {
    let mut buf = vec![0u8; MAX_MESSAGE];
    loop {
        let (n, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "control socket receive failed");
                continue;
            }
        };

        apply_message(&control, &buf[..n], peer);
    }
}

/// Decode one datagram and hand it to the scheduler; malformed ones are logged
/// and dropped. Returns whether the control changed.
fn apply_message(control: &SharedControlState, bytes: &[u8], peer: SocketAddr) -> bool {
    match parse_control(bytes) {
        Ok(update) => {
            control.update(update);
            observability::record_control_update(&update);
            info!(
                %peer,
                offset_ns = update.offset,
                enabled = ?update.enabled_bits().collect::<Vec<_>>(),
                "tracking control updated"
            );
            true
        }
        Err(e) => {
            warn!(%peer, error = %e, "ignoring malformed control message");
            false
        }
    }
}
