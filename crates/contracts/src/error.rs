//! Layered error definitions
//!
//! Categorized by source: config / hardware / sink

use thiserror::Error;

use crate::{DeviceId, Timestamp};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Hardware Errors =====
    /// Error reported by the tracking runtime
    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink connection error
    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}

/// Failure reported by a hardware query (pose, views, hands, face).
///
/// Only [`HardwareError::TimeOutOfWindow`] is recoverable: the queried instant
/// lies outside the range the runtime can predict or remember. Every other
/// variant is fatal to the sampling loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    /// Queried instant outside the supported lookahead/lookbehind range
    #[error("time {at} is outside the supported prediction window")]
    TimeOutOfWindow { at: Timestamp },

    /// Tracking space for a device is no longer valid
    #[error("tracking space for {device} is invalid")]
    SpaceInvalid { device: DeviceId },

    /// Runtime call failed
    #[error("runtime call '{call}' failed: {message}")]
    Runtime { call: &'static str, message: String },

    /// The runtime session was lost
    #[error("runtime session lost")]
    SessionLost,
}

impl HardwareError {
    /// Create runtime error
    pub fn runtime(call: &'static str, message: impl Into<String>) -> Self {
        Self::Runtime {
            call,
            message: message.into(),
        }
    }

    /// Whether the error is the tolerated time-out-of-window condition
    pub fn is_time_out_of_window(&self) -> bool {
        matches!(self, Self::TimeOutOfWindow { .. })
    }
}
