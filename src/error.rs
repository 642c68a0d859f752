//! Error types for aprendiz

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for aprendiz operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by policies, the trainer and their collaborators
///
/// Policies never recover from these; every variant is propagated to the
/// caller of the trainer unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// A named batch does not carry the requested field
    #[error("Batch has no field '{field}' (available: {available:?})")]
    MissingBatchField { field: String, available: Vec<String> },

    /// The driver has no aggregated value for the requested metric
    #[error("No callback metric named '{0}' for the current epoch")]
    MissingMetric(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration value is out of range
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// The experiment logger rejected a write
    #[error("Logger error: {0}")]
    Logger(String),

    /// Experiment tracking failure
    #[error("Tracking error: {0}")]
    Tracking(#[from] crate::tracking::TrackingError),

    /// Cross-worker reduction failed (poisoned group or rank mismatch)
    #[error("Synchronization error: {0}")]
    Sync(String),

    /// IO error with the offending path
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build an IO error that remembers the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::ConfigError(format!("Failed to parse YAML config: {e}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
