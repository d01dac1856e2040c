//! Dataset Loaders
//!
//! A dataset is either a tree of instance files (images, audio clips) or a
//! set of JSON Lines files with one record per line. Loaders hand out
//! instance handles lazily; nothing is decoded here.

use crate::cache::{ArtifactKind, CacheDir};
use crate::error::DataError;
use crate::manifest::Manifest;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix of the reduced-size variant of a dataset
pub const SAMPLE_SUFFIX: &str = "-sample";

/// Lazy, finite sequence of dataset instances
pub type Instances = Box<dyn Iterator<Item = Result<DatasetInstance, DataError>> + Send>;

/// How a dataset stores its instances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceFormat {
    /// Every file below the dataset directory is an instance, optionally
    /// restricted to one extension
    Files {
        /// Extension without the dot, e.g. `"png"`
        extension: Option<&'static str>,
    },
    /// Every valid line of every `*.jsonl` file is an instance
    JsonLines,
}

/// A named dataset and its on-disk format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Base dataset name, without the sample suffix
    pub name: &'static str,
    /// Instance layout
    pub format: InstanceFormat,
}

impl DatasetSpec {
    /// Name of the full or sample variant
    pub fn variant(&self, use_sample: bool) -> String {
        dataset_name(self.name, use_sample)
    }
}

/// One dataset instance handle
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetInstance {
    /// Path to an instance file
    File(PathBuf),
    /// A parsed JSON Lines record
    Record(Value),
}

/// `{name}-sample` when sampling, otherwise `name`
pub fn dataset_name(name: &str, use_sample: bool) -> String {
    if use_sample {
        format!("{}{}", name, SAMPLE_SUFFIX)
    } else {
        name.to_string()
    }
}

/// Fail if a downloaded archive exists but does not match its manifest signature
pub fn verify_archive(cache: &CacheDir, name: &str, manifest: &Manifest) -> Result<(), DataError> {
    let entry = manifest.get(name)?;
    let archive = cache.archive_path(name);

    if archive.is_file() && !cache.archive_matches(name, &entry.signature)? {
        return Err(cache.kind().missing(format!(
            "{} archive {} does not match its manifest signature - it needs to be downloaded again",
            cache.kind().noun(),
            archive.display()
        )));
    }
    Ok(())
}

/// Load a dataset's instances from the data home
pub fn load_dataset(
    cache: &CacheDir,
    spec: &DatasetSpec,
    use_sample: bool,
) -> Result<Instances, DataError> {
    let name = spec.variant(use_sample);
    let root = cache.find(&name, None)?;
    debug!(dataset = %name, path = %root.display(), "loading dataset");

    match spec.format {
        InstanceFormat::Files { extension } => {
            let files = collect_files(&root, extension)?;
            Ok(Box::new(files.into_iter().map(|p| Ok(DatasetInstance::File(p)))))
        }
        InstanceFormat::JsonLines => {
            let files = collect_files(&root, Some("jsonl"))?;
            Ok(Box::new(JsonLinesIter::new(files)))
        }
    }
}

/// Count a dataset's instances without keeping them
pub fn count_instances(cache: &CacheDir, spec: &DatasetSpec, use_sample: bool) -> Result<u64, DataError> {
    let mut count = 0;
    for instance in load_dataset(cache, spec, use_sample)? {
        instance?;
        count += 1;
    }
    Ok(count)
}

/// Remove a dataset variant's directory and archive
pub fn cleanup_dataset(cache: &CacheDir, name: &str, use_sample: bool) -> Result<usize, DataError> {
    debug_assert_eq!(cache.kind(), ArtifactKind::Dataset);
    cache.cleanup(&dataset_name(name, use_sample))
}

/// All files below `root` (recursively), sorted, filtered by extension
fn collect_files(root: &Path, extension: Option<&str>) -> Result<Vec<PathBuf>, DataError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).map_err(|e| DataError::io(&dir, e))? {
            let path = entry.map_err(|e| DataError::io(&dir, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if extension.is_none_or(|ext| path.extension().is_some_and(|e| e == ext)) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Streams records out of JSON Lines files, skipping lines that do not parse
struct JsonLinesIter {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, std::io::Lines<BufReader<File>>)>,
}

impl JsonLinesIter {
    fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files: files.into_iter(),
            current: None,
        }
    }
}

impl Iterator for JsonLinesIter {
    type Item = Result<DatasetInstance, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let path = self.files.next()?;
                match File::open(&path) {
                    Ok(file) => self.current = Some((path, BufReader::new(file).lines())),
                    Err(e) => return Some(Err(DataError::io(path, e))),
                }
            }

            let (path, lines) = self.current.as_mut()?;
            match lines.next() {
                None => self.current = None,
                Some(Err(e)) => {
                    let path = path.clone();
                    self.current = None;
                    return Some(Err(DataError::io(path, e)));
                }
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Value>(&line) {
                        Ok(record) => return Some(Ok(DatasetInstance::Record(record))),
                        Err(e) => warn!(path = %path.display(), error = %e, "skipping invalid record"),
                    }
                }
            }
        }
    }
}
