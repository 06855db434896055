//! Errors that stop the pipeline process.
//!
//! Per-event failures never surface here; they are routed as outcomes.

use denorm_core::ConfigError;
use denorm_storage::LmdbStoreError;

use crate::settings::PipelineSettingsError;
use crate::sink::SinkError;
use crate::telemetry::TelemetryError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Settings(#[from] PipelineSettingsError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open cache store: {0}")]
    Store(#[from] LmdbStoreError),

    #[error("Failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Failed to emit event: {0}")]
    Sink(#[from] SinkError),

    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
