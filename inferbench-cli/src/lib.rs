#![warn(missing_docs)]
//! inferbench CLI Library
//!
//! This module provides the command line front end of the harness. Use
//! `inferbench::run()` (or `inferbench_cli::run()`) in a main function to get
//! the full CLI over every benchmark plugin linked into the binary.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     inferbench_cli::run()
//! }
//! ```

mod config;
mod planner;
mod runner;

pub use config::*;
pub use planner::{ExecutionPlan, build_plan, resolve_exclude};
pub use runner::{
    BenchmarkRunner, INFERENCING, PREPROCESSING, RowSummary, RunnerConfig, RunnerState,
    compute_statistics, format_human_output,
};

use anyhow::{Context, ensure};
use clap::{Args, Parser, Subcommand};
use inferbench_core::{BenchmarkOptions, Device, registered};
use inferbench_data::{ArtifactKind, CacheDir};
use inferbench_report::{OutputFormat, dumps, load_results};
use rayon::ThreadPoolBuilder;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// inferbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "inferbench")]
#[command(author, version, about = "inferbench - inference benchmarking harness")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Optional subcommand; defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Run arguments used when no subcommand is given
    #[command(flatten)]
    pub run: RunArgs,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (inferbench.toml is discovered otherwise)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run benchmarks (default)
    Run(RunArgs),
    /// List all registered benchmarks
    List,
    /// Print a saved results file
    Show {
        /// Results JSON written by `run`
        path: PathBuf,
    },
    /// Remove cached datasets and models
    Cleanup {
        /// Only the data home
        #[arg(long)]
        data: bool,
        /// Only the model home
        #[arg(long)]
        models: bool,
    },
    /// Write a default inferbench.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Benchmark selection and runner settings
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Benchmarks to run (all registered benchmarks when empty)
    pub names: Vec<String>,

    /// Run only these benchmarks (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Skip these benchmarks (comma separated); wins over --include
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Runs per benchmark
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: Option<u32>,

    /// Maximum instances per run; zero or negative runs no instances
    #[arg(short, long, allow_hyphen_values = true)]
    pub limit: Option<i64>,

    /// Device label (cpu, cuda[:N], mps, tflite, apu, npu, vulkan)
    #[arg(short, long, value_parser = Device::from_str)]
    pub device: Option<Device>,

    /// Environment label recorded with every measurement
    #[arg(short, long)]
    pub env: Option<String>,

    /// Dataset cache home
    #[arg(long)]
    pub data_home: Option<PathBuf>,

    /// Model cache home
    #[arg(long)]
    pub model_home: Option<PathBuf>,

    /// Datasets manifest
    #[arg(long)]
    pub datasets_manifest: Option<PathBuf>,

    /// Models manifest
    #[arg(long)]
    pub models_manifest: Option<PathBuf>,

    /// Use full datasets instead of the -sample variants
    #[arg(long)]
    pub full: bool,

    /// Keep cached models and datasets after the last run
    #[arg(long)]
    pub no_cleanup: bool,

    /// Results file (defaults to a timestamped file in the output directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress progress bars and the results table
    #[arg(short, long)]
    pub quiet: bool,

    /// Terminal output format: human or json
    #[arg(long, value_parser = OutputFormat::from_str)]
    pub format: Option<OutputFormat>,

    /// Draw random shapes for the batched-dot benchmarks
    #[arg(long)]
    pub fuzz: bool,

    /// Seed for --fuzz
    #[arg(long, requires = "fuzz")]
    pub seed: Option<u64>,

    /// Threads for parallel statistics computation (0 = all cores)
    #[arg(long, short = 'j', default_value = "0")]
    pub threads: usize,
}

/// Run the inferbench CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` on success, including runs with partial failures.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the inferbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let filter = if cli.verbose {
        "inferbench=debug"
    } else {
        "inferbench=info"
    };
    // A subscriber may already be installed by an embedding binary
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = match &cli.config {
        Some(path) => InferConfig::load(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?,
        None => InferConfig::discover().unwrap_or_default(),
    };

    match cli.command {
        Some(Commands::Run(ref args)) => run_benchmarks(args, &config),
        Some(Commands::List) => list_benchmarks(),
        Some(Commands::Show { ref path }) => show_results(path, &config),
        Some(Commands::Cleanup { data, models }) => cleanup(&config, data, models),
        Some(Commands::Init { force }) => init_config(force),
        None => run_benchmarks(&cli.run, &config),
    }
}

fn list_benchmarks() -> anyhow::Result<()> {
    println!("inferbench benchmarks:");

    let benchmarks = registered();
    for bench in &benchmarks {
        let data = if bench.requires_manifest {
            " [data]"
        } else {
            ""
        };
        println!("├── {}{}", bench.name, data);
        println!("│   └── {}", bench.description);
    }

    println!("{} benchmarks found.", benchmarks.len());
    Ok(())
}

/// Layer inferbench.toml defaults under the command line flags
pub fn build_runner_config(args: &RunArgs, config: &InferConfig) -> anyhow::Result<RunnerConfig> {
    let runs = args.runs.unwrap_or(config.runner.runs);
    ensure!(runs >= 1, "runs must be at least 1 (got {})", runs);

    let device = match &args.device {
        Some(device) => Some(device.to_string()),
        None => config
            .runner
            .device
            .as_deref()
            .map(Device::from_str)
            .transpose()?
            .map(|d| d.to_string()),
    };

    let mut options = BenchmarkOptions {
        data_home: args.data_home.clone().or_else(|| config.paths.data_home.clone()),
        model_home: args.model_home.clone().or_else(|| config.paths.model_home.clone()),
        use_sample: !args.full && config.runner.use_sample,
        progress: !args.quiet,
        datasets_manifest: args
            .datasets_manifest
            .clone()
            .or_else(|| config.paths.datasets_manifest.clone()),
        models_manifest: args
            .models_manifest
            .clone()
            .or_else(|| config.paths.models_manifest.clone()),
        ..BenchmarkOptions::default()
    };
    if args.fuzz {
        options.extra.insert("fuzz".into(), true.into());
    }
    if let Some(seed) = args.seed {
        options.extra.insert("seed".into(), seed.into());
    }

    Ok(RunnerConfig {
        device,
        env: args.env.clone().or_else(|| config.runner.env.clone()),
        runs,
        limit: args.limit.or(config.runner.limit),
        options,
        cleanup: !args.no_cleanup && config.runner.cleanup,
        verbose: !args.quiet,
    })
}

fn run_benchmarks(args: &RunArgs, config: &InferConfig) -> anyhow::Result<()> {
    if args.threads > 0 {
        ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .ok();
    }

    let plan = build_plan(
        registered().into_iter().copied(),
        &args.names,
        &args.include,
        &args.exclude,
    )?;
    if plan.benchmarks.is_empty() {
        println!("No benchmarks selected.");
        return Ok(());
    }

    let runner_config = build_runner_config(args, config)?;
    let format = match args.format {
        Some(format) => format,
        None => config.output.format()?,
    };
    let quiet = args.quiet;
    if !quiet {
        println!(
            "Running {} benchmarks, {} run(s) each...\n",
            plan.benchmarks.len(),
            runner_config.runs
        );
    }

    let mut runner = BenchmarkRunner::new(plan.benchmarks, runner_config)?;
    runner.run()?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&config.output.directory),
    };
    runner.save(&output)?;

    if let Some(results) = runner.results() {
        match format {
            OutputFormat::Json => println!("{}", dumps(results)?),
            OutputFormat::Human if !quiet => println!("{}", format_human_output(results)),
            OutputFormat::Human => {}
        }
    }

    Ok(())
}

fn default_output_path(directory: &Path) -> PathBuf {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    directory.join(format!("results-{}.json", stamp))
}

fn show_results(path: &Path, config: &InferConfig) -> anyhow::Result<()> {
    let results = load_results(path)
        .with_context(|| format!("cannot read results from {}", path.display()))?;

    match config.output.format()? {
        OutputFormat::Json => println!("{}", dumps(&results)?),
        OutputFormat::Human => println!("{}", format_human_output(&results)),
    }
    Ok(())
}

fn cleanup(config: &InferConfig, data: bool, models: bool) -> anyhow::Result<()> {
    let both = !data && !models;

    if data || both {
        let cache = CacheDir::resolve(ArtifactKind::Dataset, config.paths.data_home.as_deref())?;
        let removed = cache.cleanup_all()?;
        println!("Removed {} cached datasets from {}", removed, cache.root().display());
    }
    if models || both {
        let cache = CacheDir::resolve(ArtifactKind::Model, config.paths.model_home.as_deref())?;
        let removed = cache.cleanup_all()?;
        println!("Removed {} cached models from {}", removed, cache.root().display());
    }
    Ok(())
}

fn init_config(force: bool) -> anyhow::Result<()> {
    let path = PathBuf::from(CONFIG_FILE);
    ensure!(
        force || !path.exists(),
        "{} already exists (use --force to overwrite)",
        CONFIG_FILE
    );

    std::fs::write(&path, InferConfig::default_toml())
        .with_context(|| format!("cannot write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
