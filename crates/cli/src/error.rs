//! Error types for CLI operations.

use thiserror::Error;
use tracking_engine::SchedulerError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    /// The sampling loop stopped on a hardware failure
    #[error("Sampling stopped: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Sampling thread panicked")]
    SchedulerPanicked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
