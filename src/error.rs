//! Error types and handling for BorderBatch

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for BorderBatch operations
pub type Result<T> = std::result::Result<T, BorderbatchError>;

/// Fatal errors that stop a run before (or instead of) the pipeline
#[derive(Debug, Error)]
pub enum BorderbatchError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Input folder could not be listed
    #[error("Cannot read input directory {path:?}: {source}")]
    InputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output folder could not be created
    #[error("Cannot create output directory {path:?}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker pool wiring errors
    #[error("Parallel processing error: {message}")]
    ParallelError { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),
}

impl BorderbatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new parallel processing error
    pub fn parallel<S: Into<String>>(message: S) -> Self {
        Self::ParallelError {
            message: message.into(),
        }
    }

    /// Get the associated path if available
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::InputDirectory { path, .. } | Self::OutputDirectory { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::InputDirectory { path, source } => {
                format!("Error reading directory {}: {}", path.display(), source)
            }
            Self::OutputDirectory { path, source } => {
                format!("Error creating output folder {}: {}", path.display(), source)
            }
            Self::ConfigError { message } => format!("Invalid configuration: {}", message),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for BorderbatchError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for BorderbatchError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

/// Coarse classification of a per-image failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    UnsupportedFormat,
    DecodeError,
    IoError,
    Internal,
}

/// Per-image failure, carried as a value inside the image's result.
///
/// These never abort a batch or a worker; they are counted as failed images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("unsupported image format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("error decoding image: {0}")]
    Decode(String),

    #[error("{0}")]
    Io(String),

    #[error("worker task failed: {0}")]
    WorkerPanic(String),
}

impl JobError {
    pub fn unsupported_format<S: Into<String>>(extension: S) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Wrap an I/O failure with a short description of the step that failed
    pub fn io(step: &str, err: impl std::fmt::Display) -> Self {
        Self::Io(format!("error {}: {}", step, err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Decode(_) => ErrorKind::DecodeError,
            Self::Io(_) => ErrorKind::IoError,
            Self::WorkerPanic(_) => ErrorKind::Internal,
        }
    }
}
