//! Affinity score distribution

use crate::record::Score;
use rand::Rng;
use rand_distr::{Beta, Distribution};

/// Shape parameters of the affinity distribution
const BETA_ALPHA: f64 = 1.0;
const BETA_BETA: f64 = 3.0;

/// Draws Beta(1, 3) scores rounded to three decimal digits
#[derive(Debug, Clone)]
pub struct ScoreSampler {
    beta: Beta<f64>,
}

impl ScoreSampler {
    pub fn new() -> Self {
        Self {
            beta: Beta::new(BETA_ALPHA, BETA_BETA).expect("Invalid Beta parameters"),
        }
    }

    /// Draw one score
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Score {
        Score::from_f64(self.beta.sample(rng))
    }
}

impl Default for ScoreSampler {
    fn default() -> Self {
        Self::new()
    }
}
