//! Data layer errors

use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating, verifying or removing cached artifacts
#[derive(Debug, Error)]
pub enum DataError {
    /// A dataset is missing from the manifest or from disk
    #[error("{0}")]
    Datasets(String),

    /// A model is missing from the manifest or from disk
    #[error("{0}")]
    Models(String),

    /// A manifest could not be read or parsed
    #[error("could not load manifest {path}: {message}")]
    Manifest {
        /// Manifest location
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// Filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}
