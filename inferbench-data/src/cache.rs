//! Cache Directories
//!
//! Datasets and models live in two cache roots ("homes"). A home is resolved
//! from an explicit path, then the `INFERBENCH_DATA` / `INFERBENCH_MODELS`
//! environment variables, then `~/.inferbench/{data,models}`, and is created
//! if missing.
//!
//! Inside a home every artifact `name` owns a directory `name/` and may have
//! a downloaded archive `name.zip` next to it.

use crate::error::DataError;
use crate::signature::sha256sum;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the data home
pub const DATA_HOME_ENV: &str = "INFERBENCH_DATA";

/// Environment variable overriding the model home
pub const MODEL_HOME_ENV: &str = "INFERBENCH_MODELS";

/// Extension of downloaded artifact archives
pub const ARCHIVE_EXT: &str = "zip";

/// Which kind of artifact a cache holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Benchmark datasets
    Dataset,
    /// Model weights and processors
    Model,
}

impl ArtifactKind {
    /// Lower-case name used in messages
    pub fn noun(self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "dataset",
            ArtifactKind::Model => "model",
        }
    }

    fn env_var(self) -> &'static str {
        match self {
            ArtifactKind::Dataset => DATA_HOME_ENV,
            ArtifactKind::Model => MODEL_HOME_ENV,
        }
    }

    fn default_leaf(self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "data",
            ArtifactKind::Model => "models",
        }
    }

    /// Build the kind-specific "not found" error
    pub fn missing(self, message: String) -> DataError {
        match self {
            ArtifactKind::Dataset => DataError::Datasets(message),
            ArtifactKind::Model => DataError::Models(message),
        }
    }
}

/// A resolved cache root for one artifact kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDir {
    kind: ArtifactKind,
    root: PathBuf,
}

impl CacheDir {
    /// Resolve and create the cache root
    pub fn resolve(kind: ArtifactKind, path: Option<&Path>) -> Result<Self, DataError> {
        let root = match path {
            Some(p) => expand_path(&p.to_string_lossy()),
            None => match std::env::var(kind.env_var()) {
                Ok(value) if !value.trim().is_empty() => expand_path(&value),
                _ => default_root(kind),
            },
        };

        if !root.exists() {
            debug!(path = %root.display(), "creating {} home", kind.noun());
            fs::create_dir_all(&root).map_err(|e| DataError::io(&root, e))?;
        }

        Ok(Self { kind, root })
    }

    /// Artifact kind
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory an artifact is extracted into
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Location of an artifact's downloaded archive
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, ARCHIVE_EXT))
    }

    /// Whether the artifact directory exists
    pub fn exists(&self, name: &str) -> bool {
        self.artifact_path(name).is_dir()
    }

    /// Locate an artifact directory, or a file inside it
    pub fn find(&self, name: &str, fname: Option<&str>) -> Result<PathBuf, DataError> {
        let path = match fname {
            Some(f) => self.artifact_path(name).join(f),
            None => self.artifact_path(name),
        };

        if path.exists() {
            Ok(path)
        } else {
            Err(self.kind.missing(format!(
                "could not find {} at {} - does it need to be downloaded?",
                self.kind.noun(),
                path.display()
            )))
        }
    }

    /// Whether the archive exists and its SHA-256 matches `signature`
    pub fn archive_matches(&self, name: &str, signature: &str) -> Result<bool, DataError> {
        let path = self.archive_path(name);
        if !path.is_file() {
            return Ok(false);
        }
        Ok(sha256sum(&path)?.eq_ignore_ascii_case(signature))
    }

    /// Remove an artifact directory and archive; returns how many were removed
    pub fn cleanup(&self, name: &str) -> Result<usize, DataError> {
        let mut removed = 0;

        let dir = self.artifact_path(name);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| DataError::io(&dir, e))?;
            removed += 1;
        }

        let archive = self.archive_path(name);
        if archive.exists() {
            fs::remove_file(&archive).map_err(|e| DataError::io(&archive, e))?;
            removed += 1;
        }

        if removed > 0 {
            debug!(name, removed, "removed cached {}", self.kind.noun());
        }
        Ok(removed)
    }

    /// Remove every artifact directory and archive under the root
    pub fn cleanup_all(&self) -> Result<usize, DataError> {
        let entries = fs::read_dir(&self.root).map_err(|e| DataError::io(&self.root, e))?;
        let mut removed = 0;

        for entry in entries {
            let path = entry.map_err(|e| DataError::io(&self.root, e))?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path).map_err(|e| DataError::io(&path, e))?;
                removed += 1;
            } else if path.extension().is_some_and(|ext| ext == ARCHIVE_EXT) {
                fs::remove_file(&path).map_err(|e| DataError::io(&path, e))?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

/// Resolve the data home, creating it if needed
pub fn get_data_home(path: Option<&Path>) -> Result<PathBuf, DataError> {
    CacheDir::resolve(ArtifactKind::Dataset, path).map(|c| c.root)
}

/// Resolve the model home, creating it if needed
pub fn get_model_home(path: Option<&Path>) -> Result<PathBuf, DataError> {
    CacheDir::resolve(ArtifactKind::Model, path).map(|c| c.root)
}

fn default_root(kind: ArtifactKind) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".inferbench")
        .join(kind.default_leaf())
}

/// Expand a leading `~` and `$VAR` / `${VAR}` references.
///
/// Unknown variables are left untouched.
pub fn expand_path(raw: &str) -> PathBuf {
    let expanded = expand_vars(raw.trim());

    if expanded == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = expanded.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(expanded)
}

fn expand_vars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match std::env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}
