//! Manifests
//!
//! A manifest is the signed index of downloadable artifacts: a JSON object
//! mapping artifact names to their archive URL, SHA-256 signature and, for
//! datasets, instance and per-class counts.
//!
//! ```json
//! {
//!   "dialects-sample": {
//!     "url": "https://storage.example.com/inferbench/v1/datasets/dialects-sample.zip",
//!     "signature": "9f86d081...",
//!     "instances": 120,
//!     "classes": { "irish": 40, "scottish": 80 }
//!   }
//! }
//! ```

use crate::cache::ArtifactKind;
use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of a manifest stored in a cache home
pub const MANIFEST_FILE: &str = "manifest.json";

/// One downloadable artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Archive download location
    pub url: String,
    /// SHA-256 of the archive
    pub signature: String,
    /// Number of instances (datasets only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<u64>,
    /// Instances per class label (datasets only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<BTreeMap<String, u64>>,
}

/// Name-indexed set of artifacts of one kind
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    kind: ArtifactKind,
    source: Option<PathBuf>,
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Build a manifest from entries
    pub fn new(kind: ArtifactKind, entries: BTreeMap<String, ManifestEntry>) -> Self {
        Self {
            kind,
            source: None,
            entries,
        }
    }

    /// Load a manifest file. Any failure is a [`DataError::Manifest`].
    pub fn load(kind: ArtifactKind, path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let manifest_error = |message: String| DataError::Manifest {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| manifest_error(e.to_string()))?;
        let entries: BTreeMap<String, ManifestEntry> =
            serde_json::from_str(&content).map_err(|e| manifest_error(e.to_string()))?;

        Ok(Self {
            kind,
            source: Some(path.to_path_buf()),
            entries,
        })
    }

    /// Artifact kind described by this manifest
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// File the manifest was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Look up an entry; absent names are a Datasets/Models error
    pub fn get(&self, name: &str) -> Result<&ManifestEntry, DataError> {
        self.entries.get(name).ok_or_else(|| {
            self.kind
                .missing(format!("no {} named {} exists", self.kind.noun(), name))
        })
    }

    /// Whether the manifest lists `name`
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Listed artifact names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instance count recorded for a dataset, if any
    pub fn instance_count(&self, name: &str) -> Result<Option<u64>, DataError> {
        Ok(self.get(name)?.instances)
    }
}
