//! Configuration types for userlist-gen
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Probability auto-completion and validation
//! - Runtime pipeline configuration with validation

use crate::error::ConfigError;
use crate::membership::MembershipTable;
use crate::sample::SamplingStrategy;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 512;

/// Maximum shard count (each merge opens one file per shard)
pub const MAX_SHARDS: usize = 4096;

/// Default population size
pub const DEFAULT_USERS: u64 = 3_000_000;

/// Default sampling rate
pub const DEFAULT_SAMPLING_RATE: f64 = 0.1;

/// Default retry count for transient shard I/O failures
pub const DEFAULT_RETRIES: u32 = 2;

/// Generate ranked synthetic user lists for three overlapping categories
#[derive(Parser, Debug, Clone)]
#[command(
    name = "userlist-gen",
    version,
    about = "Generate ranked synthetic user lists for three overlapping categories",
    long_about = "Generates a synthetic population split over three overlapping categories.\n\n\
                  Each user is assigned one of the 7 non-empty category subsets with the given\n\
                  probabilities (p1 p2 p3 p12 p13 p23 [p123]) and a Beta(1,3) affinity score per\n\
                  category. Shards are generated in parallel, merged into globally ranked\n\
                  list{1,2,3}.tsv files and sampled into sample{1,2,3}.tsv.\n\n\
                  If p123 is omitted it is derived as 1 - sum(others).",
    after_help = "EXAMPLES:\n    \
        userlist-gen 0.25 0.35 0.25 0.06 0.03 0.04 0.02 -u 1000000 -d output\n    \
        userlist-gen 0.25 0.35 0.25 0.06 0.03 0.04 -s 8 -r 0.05 --strategy bernoulli\n    \
        userlist-gen merge merged.tsv a.tsv b.tsv c.tsv\n    \
        userlist-gen sample merged.tsv sample.tsv --rate 0.1",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct CliArgs {
    /// Membership probabilities: p1 p2 p3 p12 p13 p23 [p123]
    #[arg(
        value_name = "PROB",
        num_args = 6..=7,
        required = true,
        allow_negative_numbers = true
    )]
    pub probabilities: Vec<f64>,

    /// Subcommand (merge, sample)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Number of unique users to generate
    #[arg(short = 'u', long, default_value_t = DEFAULT_USERS, value_name = "NUM")]
    pub users: u64,

    /// Sampling rate for sample{1,2,3}.tsv
    #[arg(short = 'r', long, default_value_t = DEFAULT_SAMPLING_RATE, value_name = "RATE")]
    pub sampling_rate: f64,

    /// Directory for output results
    #[arg(short = 'd', long, default_value = "output", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Number of shards the population is split into
    #[arg(short = 's', long, default_value_t = num_cpus::get(), value_name = "NUM")]
    pub splits: usize,

    /// Maximum number of generation threads
    #[arg(short = 'n', long, default_value_t = num_cpus::get(), value_name = "NUM")]
    pub max_workers: usize,

    /// Sampling strategy
    #[arg(long, value_enum, default_value_t = SamplingStrategy::ExactCount)]
    pub strategy: SamplingStrategy,

    /// Seed for reproducible runs (random if not set)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Retries per shard for transient I/O errors
    #[arg(long, default_value_t = DEFAULT_RETRIES, value_name = "NUM")]
    pub retries: u32,

    /// Keep the intermediate work directory after a successful run
    #[arg(long)]
    pub keep_work: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Merge files sorted by descending score into one sorted file
    Merge {
        /// Output file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Input files, each sorted by descending score
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        /// Verbose output (debug logging)
        #[arg(short = 'v', long)]
        verbose: bool,
    },

    /// Sample an existing list file
    Sample {
        /// Input list file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output sample file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Sampling rate
        #[arg(short = 'r', long, default_value_t = DEFAULT_SAMPLING_RATE)]
        rate: f64,

        /// Sampling strategy
        #[arg(long, value_enum, default_value_t = SamplingStrategy::ExactCount)]
        strategy: SamplingStrategy,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Verbose output (debug logging)
        #[arg(short = 'v', long)]
        verbose: bool,
    },
}

impl CliArgs {
    /// Whether debug logging was requested for the selected command
    pub fn is_verbose(&self) -> bool {
        match &self.command {
            Some(Command::Merge { verbose, .. }) | Some(Command::Sample { verbose, .. }) => {
                *verbose
            }
            None => self.verbose,
        }
    }
}

/// Build the membership table from 6 or 7 command-line probabilities
pub fn membership_from_args(values: &[f64]) -> Result<MembershipTable, ConfigError> {
    match *values {
        [p1, p2, p3, p12, p13, p23] => MembershipTable::complete([p1, p2, p3, p12, p13, p23]),
        [p1, p2, p3, p12, p13, p23, p123] => {
            MembershipTable::new([p1, p2, p3, p12, p13, p23, p123])
        }
        _ => Err(ConfigError::ProbabilityCount {
            count: values.len(),
        }),
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Membership probabilities
    pub table: MembershipTable,

    /// Total unique users
    pub users: u64,

    /// Number of shards (generation tasks)
    pub shards: usize,

    /// Generation thread count
    pub max_workers: usize,

    /// Sampling rate
    pub sampling_rate: f64,

    /// Sampling strategy
    pub strategy: SamplingStrategy,

    /// Output directory
    pub output_dir: PathBuf,

    /// Run seed; every task derives its own stream from it
    pub seed: u64,

    /// Retries per shard for transient I/O errors
    pub retries: u32,

    /// Keep the work directory after success
    pub keep_work: bool,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl PipelineConfig {
    /// Configuration with defaults for everything but the table and output
    pub fn new(table: MembershipTable, output_dir: impl Into<PathBuf>) -> Self {
        let cpus = num_cpus::get();
        Self {
            table,
            users: DEFAULT_USERS,
            shards: cpus,
            max_workers: cpus,
            sampling_rate: DEFAULT_SAMPLING_RATE,
            strategy: SamplingStrategy::default(),
            output_dir: output_dir.into(),
            seed: rand::random(),
            retries: DEFAULT_RETRIES,
            keep_work: false,
            show_progress: false,
            verbose: false,
        }
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let table = membership_from_args(&args.probabilities)?;

        let config = Self {
            table,
            users: args.users,
            shards: args.splits,
            max_workers: args.max_workers,
            sampling_rate: args.sampling_rate,
            strategy: args.strategy,
            output_dir: args.output_dir,
            seed: args.seed.unwrap_or_else(rand::random),
            retries: args.retries,
            keep_work: args.keep_work,
            show_progress: !args.quiet,
            verbose: args.verbose,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check counts, rate and output path
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users == 0 {
            return Err(ConfigError::InvalidUserCount { count: self.users });
        }

        if self.shards == 0 || self.shards > MAX_SHARDS {
            return Err(ConfigError::InvalidShardCount {
                count: self.shards,
                max: MAX_SHARDS,
            });
        }

        if self.max_workers == 0 || self.max_workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.max_workers,
                max: MAX_WORKERS,
            });
        }

        if !self.sampling_rate.is_finite() || !(0.0..=1.0).contains(&self.sampling_rate) {
            return Err(ConfigError::InvalidSamplingRate {
                rate: self.sampling_rate,
            });
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidOutputPath {
                path: self.output_dir.clone(),
                reason: "Output directory must not be empty".to_string(),
            });
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(ConfigError::InvalidOutputPath {
                path: self.output_dir.clone(),
                reason: "Path exists and is not a directory".to_string(),
            });
        }

        Ok(())
    }

    /// Number of threads the generation phase actually uses
    pub fn generation_threads(&self) -> usize {
        self.max_workers.min(self.shards)
    }
}
