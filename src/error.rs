//! Error types for the booking pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Coarse classification of a [`PipelineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Fetch,
    DataLoad,
    Processing,
    Training,
    Save,
    Logging,
    Io,
}

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse configuration {}: {reason}", path.display())]
    ConfigParse { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Data load error: {0}")]
    DataLoadError(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Failed to save {}: {source}", path.display())]
    SaveError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Which part of the taxonomy this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ConfigNotFound(_)
            | PipelineError::ConfigParse { .. }
            | PipelineError::InvalidConfig(_) => ErrorKind::Config,
            PipelineError::FetchError(_) => ErrorKind::Fetch,
            PipelineError::DataLoadError(_) => ErrorKind::DataLoad,
            PipelineError::ProcessingError(_) => ErrorKind::Processing,
            PipelineError::TrainingError(_) => ErrorKind::Training,
            PipelineError::SaveError { .. } => ErrorKind::Save,
            PipelineError::LoggingError(_) => ErrorKind::Logging,
            PipelineError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataLoadError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::TrainingError(format!("invalid shape: {}", err))
    }
}
