//! Error taxonomy
//!
//! Run-scoped errors (see [`BenchmarkError::is_run_scoped`]) are recovered by
//! the runner at plugin-run granularity; everything else aborts the caller.

use crate::device::DeviceError;
use inferbench_data::DataError;
use inferbench_report::SerializationError;
use thiserror::Error;

/// Failures raised by benchmarks and the machinery around them
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// Invalid runner or plugin configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A dataset is missing or unusable
    #[error("{0}")]
    Datasets(String),

    /// A model is missing or unusable
    #[error("{0}")]
    Models(String),

    /// A preprocess or inference step could not complete
    #[error("{0}")]
    Inference(String),

    /// Unrecognised compute device
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Any other benchmark-internal failure
    #[error("{0}")]
    Benchmark(String),

    /// Data layer failure
    #[error(transparent)]
    Data(#[from] DataError),

    /// Filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Results could not be written or read
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl BenchmarkError {
    /// Whether the runner records this error and continues with the next run
    pub fn is_run_scoped(&self) -> bool {
        match self {
            BenchmarkError::Datasets(_)
            | BenchmarkError::Models(_)
            | BenchmarkError::Inference(_)
            | BenchmarkError::Benchmark(_)
            | BenchmarkError::Io(_) => true,
            BenchmarkError::Data(e) => !matches!(e, DataError::Manifest { .. }),
            BenchmarkError::Configuration(_)
            | BenchmarkError::Device(_)
            | BenchmarkError::Serialization(_) => false,
        }
    }

    /// Short kind name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            BenchmarkError::Configuration(_) => "configuration",
            BenchmarkError::Datasets(_) => "datasets",
            BenchmarkError::Models(_) => "models",
            BenchmarkError::Inference(_) => "inference",
            BenchmarkError::Device(_) => "device",
            BenchmarkError::Benchmark(_) => "benchmark",
            BenchmarkError::Data(DataError::Datasets(_)) => "datasets",
            BenchmarkError::Data(DataError::Models(_)) => "models",
            BenchmarkError::Data(DataError::Manifest { .. }) => "configuration",
            BenchmarkError::Data(DataError::Io { .. }) | BenchmarkError::Io(_) => "io",
            BenchmarkError::Serialization(_) => "serialization",
        }
    }
}
