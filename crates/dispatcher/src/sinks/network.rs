//! NetworkSink - UDP fire-and-forget datagrams

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::Bytes;
use contracts::{ContractError, PacketSink, TelemetryPacket};
use tokio::net::UdpSocket;
use tracing::{debug, error, instrument, warn};

use crate::error::DispatcherError;

/// Datagram encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkFormat {
    #[default]
    Json,
    Bincode,
}

#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    pub addr: SocketAddr,
    pub format: NetworkFormat,
    /// Larger datagrams are dropped (IPv4 UDP payload limit is 65507)
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{addr_str}': {e}"))?;

        let format = match params.get("format").map(String::as_str) {
            Some("bincode") => NetworkFormat::Bincode,
            Some("json") | None => NetworkFormat::Json,
            Some(other) => return Err(format!("unknown format '{other}'")),
        };

        let max_packet_size = params
            .get("max_packet_size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(65000);

        Ok(Self {
            addr,
            format,
            max_packet_size,
        })
    }

    /// Encode one packet as a datagram payload
    pub fn encode(&self, packet: &TelemetryPacket) -> Result<Bytes, DispatcherError> {
        let data = match self.format {
            NetworkFormat::Json => serde_json::to_vec(packet)
                .map_err(|e| DispatcherError::encode(packet.kind(), e))?,
            NetworkFormat::Bincode => bincode::serialize(packet)
                .map_err(|e| DispatcherError::encode(packet.kind(), e))?,
        };
        if data.len() > self.max_packet_size {
            return Err(DispatcherError::encode(
                packet.kind(),
                format!("{} bytes exceeds limit {}", data.len(), self.max_packet_size),
            ));
        }
        Ok(Bytes::from(data))
    }
}

/// Sink that sends each packet as one UDP datagram
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    socket: Option<UdpSocket>,
}

impl NetworkSink {
    #[instrument(name = "network_sink_new", skip(name, config), fields(target = %config.addr))]
    pub async fn new(name: impl Into<String>, config: NetworkSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        let bind: SocketAddr = if config.addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(&config.addr).await?;

        debug!(sink = %name, target = %config.addr, "NetworkSink connected");

        Ok(Self {
            name,
            config,
            socket: Some(socket),
        })
    }

    #[instrument(name = "network_sink_from_params", skip(name, params))]
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;

        let sink_name = name.clone();
        Self::new(name, config)
            .await
            .map_err(|e| ContractError::sink_connection(sink_name, e.to_string()))
    }

    fn socket(&self) -> Result<&UdpSocket, ContractError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_write(&self.name, "socket not connected"))
    }
}

impl PacketSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "network_sink_write", skip_all, fields(sink = %self.name))]
    async fn write(&mut self, packet: &TelemetryPacket) -> Result<(), ContractError> {
        let socket = self.socket()?;
        let data = match self.config.encode(packet) {
            Ok(data) => data,
            Err(e) => {
                warn!(sink = %self.name, error = %e, "datagram dropped");
                return Err(ContractError::sink_write(&self.name, e.to_string()));
            }
        };

        // UDP 尽力而为：发送失败只记录，不向上返回
        match socket.send(&data).await {
            Ok(sent) => debug!(sink = %self.name, kind = %packet.kind(), bytes = sent, "sent"),
            Err(e) => error!(sink = %self.name, error = %e, "UDP send failed"),
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "network_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(sink = %self.name, "NetworkSink closed");
        Ok(())
    }
}
