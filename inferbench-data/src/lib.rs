#![warn(missing_docs)]
//! inferbench Data Layer
//!
//! Local management of benchmark datasets and model artifacts:
//! - Cache homes (`INFERBENCH_DATA`, `INFERBENCH_MODELS`, `~/.inferbench/...`)
//! - Manifests listing artifact URLs, SHA-256 signatures and instance counts
//! - Lazy dataset loaders for file trees and JSON Lines records
//! - Idempotent cleanup returning the number of removed artifacts
//!
//! Fetching artifacts over the network is not handled here; a missing
//! artifact is reported as a [`DataError::Datasets`] or [`DataError::Models`].

mod cache;
mod datasets;
mod error;
mod manifest;
mod models;
mod signature;

pub use cache::{
    ARCHIVE_EXT, ArtifactKind, CacheDir, DATA_HOME_ENV, MODEL_HOME_ENV, expand_path,
    get_data_home, get_model_home,
};
pub use datasets::{
    DatasetInstance, DatasetSpec, InstanceFormat, Instances, SAMPLE_SUFFIX, cleanup_dataset,
    count_instances, dataset_name, load_dataset, verify_archive,
};
pub use error::DataError;
pub use manifest::{MANIFEST_FILE, Manifest, ManifestEntry};
pub use models::{cleanup_model, find_model_path};
pub use signature::sha256sum;
