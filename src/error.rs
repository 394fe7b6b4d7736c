//! Error types for userlist-gen
//!
//! This module defines the error hierarchy for every pipeline layer:
//! - Configuration and CLI errors
//! - Shard generation and publishing errors
//! - External merge errors
//! - Sampling errors
//! - Worker thread errors
//!
//! Library code returns these typed errors; the binary wraps them with
//! `anyhow` context before printing.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Shard generation errors
    #[error("Shard error: {0}")]
    Shard(#[from] ShardError),

    /// Merge errors
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Sampling errors
    #[error("Sample error: {0}")]
    Sample(#[from] SampleError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors outside a specific phase (output dir, cleanup)
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Cancelled because a sibling task failed or a signal was received
    #[error("Operation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// True if this error is only a consequence of cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Cancelled
                | PipelineError::Shard(ShardError::Cancelled)
                | PipelineError::Merge(MergeError::Cancelled)
                | PipelineError::Sample(SampleError::Cancelled)
        )
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A single probability is negative or not a number
    #[error("Invalid probability {name}={value}: must be a finite value in [0, 1]")]
    InvalidProbability { name: &'static str, value: f64 },

    /// Wrong number of probabilities on the command line
    #[error("Expected 6 or 7 probabilities (p1 p2 p3 p12 p13 p23 [p123]), got {count}")]
    ProbabilityCount { count: usize },

    /// The six explicit probabilities already exceed 1
    #[error("The sum of probabilities exceeds 1 (sum = {sum})")]
    ProbabilitiesExceedOne { sum: f64 },

    /// Seven explicit probabilities do not sum to 1
    #[error("Probabilities must sum to 1 (sum = {sum}, tolerance = {tolerance})")]
    ProbabilitySum { sum: f64, tolerance: f64 },

    /// Invalid population size
    #[error("Invalid user count {count}: must be at least 1")]
    InvalidUserCount { count: u64 },

    /// Invalid shard count
    #[error("Invalid shard count {count}: must be between 1 and {max}")]
    InvalidShardCount { count: usize, max: usize },

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid sampling rate
    #[error("Invalid sampling rate {rate}: must be within [0, 1]")]
    InvalidSamplingRate { rate: f64 },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// Errors while generating or publishing shard files
#[derive(Error, Debug)]
pub enum ShardError {
    /// Failed to create the shard work directory
    #[error("Failed to create shard directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed while writing shard rows
    #[error("Failed to write shard file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to rename a completed shard file into place
    #[error("Failed to publish shard file '{path}': {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Shard task stopped because the pipeline was cancelled
    #[error("Shard generation cancelled")]
    Cancelled,
}

impl ShardError {
    /// Check if this error is worth retrying (I/O that may not repeat)
    pub fn is_transient(&self) -> bool {
        let source = match self {
            ShardError::CreateDir { source, .. }
            | ShardError::Write { source, .. }
            | ShardError::Publish { source, .. } => source,
            ShardError::Cancelled => return false,
        };

        matches!(
            source.kind(),
            io::ErrorKind::Interrupted
                | io::ErrorKind::WouldBlock
                | io::ErrorKind::TimedOut
                | io::ErrorKind::ResourceBusy
                | io::ErrorKind::Other
        )
    }
}

/// External merge errors
#[derive(Error, Debug)]
pub enum MergeError {
    /// An input shard file could not be opened
    #[error("Failed to open merge input '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An input shard file could not be read
    #[error("Failed to read merge input '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An input line is not `identifier<TAB>score`
    #[error("Malformed line {line} in '{path}': {reason}")]
    MalformedLine {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// An input file is not sorted by non-increasing score
    #[error("Input '{path}' is not sorted: line {line} has score {found} after {previous}")]
    UnsortedInput {
        path: PathBuf,
        line: u64,
        previous: String,
        found: String,
    },

    /// Failed to write or publish the merged output
    #[error("Failed to write merge output '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Merge was given no inputs
    #[error("No merge inputs given")]
    NoInputs,

    /// Merge stopped because the pipeline was cancelled
    #[error("Merge cancelled")]
    Cancelled,
}

/// Sampling errors
#[derive(Error, Debug)]
pub enum SampleError {
    /// Sampling rate outside [0, 1]
    #[error("Invalid sampling rate {rate}: must be within [0, 1]")]
    InvalidRate { rate: f64 },

    /// Source list could not be opened
    #[error("Failed to open sample source '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source list could not be read
    #[error("Failed to read sample source '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write or publish the sample
    #[error("Failed to write sample '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source list is shorter than the row count it was announced with
    #[error("Sample source '{path}' has {found} rows, expected {expected}")]
    RowCountMismatch {
        path: PathBuf,
        expected: u64,
        found: u64,
    },

    /// Sampling stopped because the pipeline was cancelled
    #[error("Sampling cancelled")]
    Cancelled,
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Task panicked
    #[error("Task '{task}' panicked: {message}")]
    Panicked { task: String, message: String },

    /// Failed to spawn a pool thread
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Pool result channel closed before every task reported
    #[error("Result channel closed with {missing} task(s) unreported")]
    ResultChannelClosed { missing: usize },
}

/// Result type alias for PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for ShardError
pub type ShardResult<T> = std::result::Result<T, ShardError>;

/// Result type alias for MergeError
pub type MergeResult<T> = std::result::Result<T, MergeError>;

/// Result type alias for SampleError
pub type SampleResult<T> = std::result::Result<T, SampleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_error_transient() {
        let busy = ShardError::Write {
            path: "/tmp/x".into(),
            source: io::Error::new(io::ErrorKind::Interrupted, "eintr"),
        };
        assert!(busy.is_transient());

        let denied = ShardError::CreateDir {
            path: "/tmp/x".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!denied.is_transient());
        assert!(!ShardError::Cancelled.is_transient());

        let full = ShardError::Publish {
            path: "/tmp/x".into(),
            source: io::Error::new(io::ErrorKind::StorageFull, "no space"),
        };
        assert!(!full.is_transient());
    }

    #[test]
    fn test_error_conversion() {
        let merge_err = MergeError::NoInputs;
        let err: PipelineError = merge_err.into();
        assert!(matches!(err, PipelineError::Merge(_)));
        assert!(!err.is_cancelled());

        let err: PipelineError = SampleError::Cancelled.into();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::ProbabilitiesExceedOne { sum: 1.2 };
        assert!(err.to_string().contains("exceeds 1"));
    }
}
