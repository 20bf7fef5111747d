//! Engine error type.

use std::path::PathBuf;

use chronicle_core::ChronicleError;
use chronicle_llm::LlmError;
use thiserror::Error;

/// Errors surfaced by the engine. Oracle failures during a turn are not
/// among them; those degrade to a fallback narrative.
#[derive(Debug, Error)]
pub enum EngineError {
    /// World model error.
    #[error(transparent)]
    Core(#[from] ChronicleError),

    /// AI collaborator setup error (prompt templates).
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Configuration could not be assembled.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Save-file I/O failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A global tracing subscriber is already installed.
    #[error("tracing already initialised: {0}")]
    Telemetry(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EngineError>;
