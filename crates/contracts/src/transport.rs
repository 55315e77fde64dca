//! Transport and sink interfaces
//!
//! `Transport` is the synchronous, fire-and-forget sink the scheduler thread
//! writes into. `PacketSink` is the async output end used by the dispatcher.

use crate::{ContractError, Packet, TelemetryPacket};

/// Fire-and-forget packet sink used by the sampling scheduler
///
/// No acknowledgement is returned. Packets sent by one caller keep their
/// relative order.
pub trait Transport: Send {
    fn send(&mut self, packet: Packet<'_>);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, packet: Packet<'_>) {
        (**self).send(packet)
    }
}

/// Packet output trait
///
/// All dispatcher sinks implement this trait.
#[trait_variant::make(PacketSink: Send)]
pub trait LocalPacketSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one packet
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, packet: &TelemetryPacket) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
