//! Bench harness errors.

use diag_common::config::ConfigError;
use diag_common::status::StatusError;
use diag_core::error::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    /// No factory registered under this driver name.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Engine rejected a device, terminator or binding.
    #[error("Wiring failed: {0}")]
    Wiring(#[from] EngineError),

    /// Configured firing status does not fit the status layout.
    #[error("Invalid firing status for terminator '{name}': {source}")]
    FiringStatus {
        name: String,
        #[source]
        source: StatusError,
    },

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Dashboard dump failed: {0}")]
    Dump(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
