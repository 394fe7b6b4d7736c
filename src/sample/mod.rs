//! Sampling of merged category lists
//!
//! Two strategies are available:
//! - [`SamplingStrategy::Bernoulli`]: every row is kept independently with
//!   probability `rate`; the sample size is binomial.
//! - [`SamplingStrategy::ExactCount`]: exactly `round(rate * rows)` distinct
//!   rows, drawn uniformly without replacement.
//!
//! Both stream the source once and keep source order.

pub mod bernoulli;
pub mod exact;

pub use bernoulli::bernoulli_sample;
pub use exact::{count_rows, exact_count_sample, target_count};

use crate::cancel::CancelToken;
use crate::error::{SampleError, SampleResult};
use rand::Rng;
use std::fmt;
use std::path::Path;

/// How rows are selected into a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SamplingStrategy {
    /// Independent per-row inclusion
    Bernoulli,
    /// Exact row count, uniform without replacement
    #[default]
    #[value(name = "exact")]
    ExactCount,
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingStrategy::Bernoulli => write!(f, "bernoulli"),
            SamplingStrategy::ExactCount => write!(f, "exact"),
        }
    }
}

/// Sample `src` into `dest` with the chosen strategy
///
/// `total_rows` is the known row count of `src` (e.g. from the merge);
/// when absent and the strategy needs it, the file is counted first.
pub fn sample_file<R: Rng + ?Sized>(
    src: &Path,
    dest: &Path,
    strategy: SamplingStrategy,
    rate: f64,
    total_rows: Option<u64>,
    rng: &mut R,
    cancel: &CancelToken,
) -> SampleResult<u64> {
    validate_rate(rate)?;

    match strategy {
        SamplingStrategy::Bernoulli => bernoulli_sample(src, dest, rate, rng, cancel),
        SamplingStrategy::ExactCount => {
            let total = match total_rows {
                Some(n) => n,
                None => count_rows(src)?,
            };
            exact_count_sample(src, dest, rate, total, rng, cancel)
        }
    }
}

pub(crate) fn validate_rate(rate: f64) -> SampleResult<()> {
    if rate.is_finite() && (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(SampleError::InvalidRate { rate })
    }
}
