//! Error types for the simulation harness.

use thiserror::Error;

/// Errors raised while setting up or exporting a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading a config file or writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config or export (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The async runtime could not be built
    #[error("Runtime error: {0}")]
    Runtime(String),
}
