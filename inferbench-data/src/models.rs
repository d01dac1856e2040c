//! Model Artifacts

use crate::cache::{ArtifactKind, CacheDir};
use crate::error::DataError;
use std::path::PathBuf;

/// Locate a model directory, or the `{name}.{ext}` file inside it
pub fn find_model_path(cache: &CacheDir, name: &str, ext: Option<&str>) -> Result<PathBuf, DataError> {
    debug_assert_eq!(cache.kind(), ArtifactKind::Model);
    match ext {
        Some(ext) => cache.find(name, Some(&format!("{}.{}", name, ext))),
        None => cache.find(name, None),
    }
}

/// Remove a model's directory and archive
pub fn cleanup_model(cache: &CacheDir, name: &str) -> Result<usize, DataError> {
    cache.cleanup(name)
}
