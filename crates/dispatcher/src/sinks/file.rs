//! FileSink - one JSON object per line

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, PacketSink, TelemetryPacket};
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory
    pub base_path: PathBuf,
    /// File name; defaults to `telemetry-<local time>.jsonl`
    pub file_name: Option<String>,
}

impl FileSinkConfig {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            base_path: params
                .get("base_path")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./output")),
            file_name: params.get("file_name").cloned(),
        }
    }

    fn resolve_file_name(&self) -> String {
        self.file_name.clone().unwrap_or_else(|| {
            format!(
                "telemetry-{}.jsonl",
                chrono::Local::now().format("%Y%m%d-%H%M%S")
            )
        })
    }
}

/// Sink that appends packets to a JSON lines file
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;
        let path = config.base_path.join(config.resolve_file_name());
        let file = File::options().create(true).append(true).open(&path)?;

        let name = name.into();
        debug!(sink = %name, path = %path.display(), "FileSink opened");
        Ok(Self {
            name,
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, ContractError> {
        self.writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(&self.name, "file already closed"))
    }

    fn append(&mut self, packet: &TelemetryPacket) -> Result<(), ContractError> {
        let name = self.name.clone();
        let writer = self.writer()?;
        serde_json::to_writer(&mut *writer, packet)
            .map_err(|e| ContractError::sink_write(&name, e.to_string()))?;
        writer
            .write_all(b"\n")
            .map_err(|e| ContractError::sink_write(&name, e.to_string()))
    }
}

impl PacketSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_sink_write", skip_all, fields(sink = %self.name))]
    async fn write(&mut self, packet: &TelemetryPacket) -> Result<(), ContractError> {
        self.append(packet)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        let name = self.name.clone();
        self.writer()?
            .flush()
            .map_err(|e| ContractError::sink_write(name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        debug!(sink = %self.name, path = %self.path.display(), "FileSink closed");
        Ok(())
    }
}
