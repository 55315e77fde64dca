//! LogSink - packet summaries via tracing

use contracts::{ContractError, PacketKind, PacketSink, TelemetryPacket};
use tracing::{debug, info, instrument};

/// Every this many tracking packets, one summary line at info level
const SUMMARY_EVERY: u64 = 1000;

/// Sink that logs packet summaries for debugging
pub struct LogSink {
    name: String,
    tracking: u64,
    hand: u64,
    face: u64,
    battery: u64,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracking: 0,
            hand: 0,
            face: 0,
            battery: 0,
        }
    }

    fn count(&mut self, kind: PacketKind) -> u64 {
        let counter = match kind {
            PacketKind::Tracking => &mut self.tracking,
            PacketKind::Hand => &mut self.hand,
            PacketKind::Face => &mut self.face,
            PacketKind::Battery => &mut self.battery,
        };
        *counter += 1;
        *counter
    }

    fn log_packet(&self, packet: &TelemetryPacket) {
        match packet {
            TelemetryPacket::Tracking(p) => debug!(
                sink = %self.name,
                t0 = p.production_timestamp,
                dt = p.timestamp - p.production_timestamp,
                devices = p.device_poses.len(),
                state = ?p.state_flags,
                "tracking"
            ),
            TelemetryPacket::Hand(p) => debug!(
                sink = %self.name,
                hand = ?p.hand,
                timestamp = p.timestamp,
                tracked = p.joints.is_some(),
                "hand"
            ),
            TelemetryPacket::Face(p) => debug!(
                sink = %self.name,
                timestamp = p.timestamp,
                "face"
            ),
            TelemetryPacket::Battery(p) => info!(
                sink = %self.name,
                present = p.present,
                charge = p.charge,
                charging = p.charging,
                "battery"
            ),
        }
    }
}

impl PacketSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_write", skip_all, fields(sink = %self.name))]
    async fn write(&mut self, packet: &TelemetryPacket) -> Result<(), ContractError> {
        let n = self.count(packet.kind());
        self.log_packet(packet);
        if packet.kind() == PacketKind::Tracking && n.is_multiple_of(SUMMARY_EVERY) {
            info!(
                sink = %self.name,
                tracking = self.tracking,
                hand = self.hand,
                face = self.face,
                battery = self.battery,
                "packets received"
            );
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            tracking = self.tracking,
            hand = self.hand,
            face = self.face,
            battery = self.battery,
            "LogSink closed"
        );
        Ok(())
    }
}
