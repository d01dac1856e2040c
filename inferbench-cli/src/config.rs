//! Configuration loading from inferbench.toml
//!
//! inferbench configuration can be specified in an `inferbench.toml` file in the
//! project root. The configuration is automatically discovered by walking up
//! from the current directory. Command line flags override file values.

use inferbench_report::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file
pub const CONFIG_FILE: &str = "inferbench.toml";

/// inferbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InferConfig {
    /// Runner defaults
    #[serde(default)]
    pub runner: RunnerDefaults,
    /// Cache and manifest locations
    #[serde(default)]
    pub paths: PathsConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Defaults for benchmark runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerDefaults {
    /// Runs per benchmark
    #[serde(default = "default_runs")]
    pub runs: u32,
    /// Instance cap per run
    #[serde(default)]
    pub limit: Option<i64>,
    /// Evict cached models and datasets after the last run
    #[serde(default = "default_true")]
    pub cleanup: bool,
    /// Use the sample variant of each dataset
    #[serde(default = "default_true")]
    pub use_sample: bool,
    /// Device label, e.g. "cpu" or "cuda:0"
    #[serde(default)]
    pub device: Option<String>,
    /// Environment label
    #[serde(default)]
    pub env: Option<String>,
}

impl Default for RunnerDefaults {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            limit: None,
            cleanup: true,
            use_sample: true,
            device: None,
            env: None,
        }
    }
}

fn default_runs() -> u32 {
    1
}
fn default_true() -> bool {
    true
}

/// Cache homes and manifests
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    /// Dataset cache home
    #[serde(default)]
    pub data_home: Option<PathBuf>,
    /// Model cache home
    #[serde(default)]
    pub model_home: Option<PathBuf>,
    /// Datasets manifest
    #[serde(default)]
    pub datasets_manifest: Option<PathBuf>,
    /// Models manifest
    #[serde(default)]
    pub models_manifest: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for results files
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    /// Terminal output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            format: default_format(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("target/inferbench")
}
fn default_format() -> String {
    "human".to_string()
}

impl OutputConfig {
    /// Parsed terminal format
    pub fn format(&self) -> anyhow::Result<OutputFormat> {
        self.format.parse().map_err(anyhow::Error::msg)
    }
}

impl InferConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# inferbench Configuration

[runner]
# Runs per benchmark; samples from all runs are merged
runs = 1
# Maximum instances per run (uncomment to enable)
# limit = 100
# Delete cached models and datasets after the last run
cleanup = true
# Use the reduced -sample variant of each dataset
use_sample = true
# Device label: cpu, cuda[:N], mps, tflite, apu, npu, vulkan (uncomment to enable)
# device = "cpu"
# Environment label recorded with every measurement (uncomment to enable)
# env = "laptop"

[paths]
# Cache homes; INFERBENCH_DATA / INFERBENCH_MODELS or ~/.inferbench/* otherwise
# data_home = "~/.inferbench/data"
# model_home = "~/.inferbench/models"
# Manifests; manifest.json in each home otherwise
# datasets_manifest = "manifests/datasets.json"
# models_manifest = "manifests/models.json"

[output]
# Directory for results files
directory = "target/inferbench"
# Terminal output format: human or json
format = "human"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferConfig::default();
        assert_eq!(config.runner.runs, 1);
        assert!(config.runner.cleanup);
        assert!(config.runner.use_sample);
        assert_eq!(config.output.format().unwrap(), OutputFormat::Human);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            runs = 3
            limit = 50
            device = "cuda:0"

            [paths]
            data_home = "$HOME/bench/data"
        "#;

        let config: InferConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.runs, 3);
        assert_eq!(config.runner.limit, Some(50));
        assert_eq!(config.runner.device.as_deref(), Some("cuda:0"));
        assert_eq!(config.paths.data_home, Some(PathBuf::from("$HOME/bench/data")));
        // Defaults should still apply
        assert!(config.runner.cleanup);
        assert_eq!(config.output.directory, PathBuf::from("target/inferbench"));
    }

    #[test]
    fn test_default_toml_parses() {
        let config: InferConfig = toml::from_str(&InferConfig::default_toml()).unwrap();
        assert_eq!(config.runner.runs, 1);
        assert!(config.paths.data_home.is_none());
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[output]\nformat = \"json\"\n").unwrap();

        let config = InferConfig::load(&path).unwrap();
        assert_eq!(config.output.format().unwrap(), OutputFormat::Json);
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let config: InferConfig = toml::from_str("[output]\nformat = \"html\"\n").unwrap();
        assert!(config.output.format().is_err());
    }
}
