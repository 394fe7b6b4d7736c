//! Category membership model
//!
//! An identifier belongs to one of the 7 non-empty subsets of the three
//! categories. [`MembershipTable`] carries one probability per subset and
//! draws a subset per identifier.

use crate::error::ConfigError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::fmt;

/// Tolerance for a probability vector summing to 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// One of the three overlapping categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    One,
    Two,
    Three,
}

impl Category {
    /// All categories in file order
    pub const ALL: [Category; 3] = [Category::One, Category::Two, Category::Three];

    /// Zero-based index, used for per-category arrays
    pub fn index(self) -> usize {
        match self {
            Category::One => 0,
            Category::Two => 1,
            Category::Three => 2,
        }
    }

    /// One-based number used in file names (`list1.tsv`, ...)
    pub fn number(self) -> usize {
        self.index() + 1
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A non-empty subset of the three categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Only1,
    Only2,
    Only3,
    Both12,
    Both13,
    Both23,
    All123,
}

impl Membership {
    /// All subsets, in probability-vector order (p1, p2, p3, p12, p13, p23, p123)
    pub const ALL: [Membership; 7] = [
        Membership::Only1,
        Membership::Only2,
        Membership::Only3,
        Membership::Both12,
        Membership::Both13,
        Membership::Both23,
        Membership::All123,
    ];

    /// Categories in this subset
    pub fn categories(self) -> &'static [Category] {
        use Category::*;
        match self {
            Membership::Only1 => &[One],
            Membership::Only2 => &[Two],
            Membership::Only3 => &[Three],
            Membership::Both12 => &[One, Two],
            Membership::Both13 => &[One, Three],
            Membership::Both23 => &[Two, Three],
            Membership::All123 => &[One, Two, Three],
        }
    }

    /// Check whether the subset contains a category
    pub fn contains(self, category: Category) -> bool {
        self.categories().contains(&category)
    }

    /// Probability name as used on the command line
    pub fn label(self) -> &'static str {
        match self {
            Membership::Only1 => "p1",
            Membership::Only2 => "p2",
            Membership::Only3 => "p3",
            Membership::Both12 => "p12",
            Membership::Both13 => "p13",
            Membership::Both23 => "p23",
            Membership::All123 => "p123",
        }
    }
}

/// Probability of each membership subset, with a sampler over them
#[derive(Debug, Clone)]
pub struct MembershipTable {
    probabilities: [f64; 7],
    index: WeightedIndex<f64>,
}

impl MembershipTable {
    /// Build from all seven probabilities
    ///
    /// Values must be finite, non-negative and sum to 1 within
    /// [`PROBABILITY_TOLERANCE`]. They are renormalized afterwards so the
    /// stored vector sums to exactly 1 up to float rounding.
    pub fn new(probabilities: [f64; 7]) -> Result<Self, ConfigError> {
        validate_each(&probabilities)?;

        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ConfigError::ProbabilitySum {
                sum,
                tolerance: PROBABILITY_TOLERANCE,
            });
        }

        let mut normalized = probabilities;
        for p in normalized.iter_mut() {
            *p /= sum;
        }

        let index = WeightedIndex::new(normalized).map_err(|_| ConfigError::ProbabilitySum {
            sum,
            tolerance: PROBABILITY_TOLERANCE,
        })?;

        Ok(Self {
            probabilities: normalized,
            index,
        })
    }

    /// Build from the six explicit probabilities, deriving p123
    ///
    /// p123 = 1 - sum(others), rounded to 9 digits. Fails if the six
    /// values already exceed 1.
    pub fn complete(explicit: [f64; 6]) -> Result<Self, ConfigError> {
        validate_each(&explicit)?;

        let sum: f64 = explicit.iter().sum();
        let p123 = ((1.0 - sum) * 1e9).round() / 1e9;
        if p123 < 0.0 {
            return Err(ConfigError::ProbabilitiesExceedOne { sum });
        }

        let [p1, p2, p3, p12, p13, p23] = explicit;
        Self::new([p1, p2, p3, p12, p13, p23, p123])
    }

    /// Probability of a subset
    pub fn probability(&self, membership: Membership) -> f64 {
        let pos = Membership::ALL
            .iter()
            .position(|m| *m == membership)
            .unwrap_or_default();
        self.probabilities[pos]
    }

    /// The full probability vector in (p1, p2, p3, p12, p13, p23, p123) order
    pub fn probabilities(&self) -> [f64; 7] {
        self.probabilities
    }

    /// Marginal probability that an identifier belongs to a category
    pub fn category_probability(&self, category: Category) -> f64 {
        Membership::ALL
            .iter()
            .filter(|m| m.contains(category))
            .map(|m| self.probability(*m))
            .sum()
    }

    /// Draw one membership subset
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Membership {
        Membership::ALL[self.index.sample(rng)]
    }
}

fn validate_each(values: &[f64]) -> Result<(), ConfigError> {
    for (membership, &value) in Membership::ALL.iter().zip(values) {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidProbability {
                name: membership.label(),
                value,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const PROBS: [f64; 7] = [0.25, 0.35, 0.25, 0.06, 0.03, 0.04, 0.02];

    #[test]
    fn test_subsets_are_distinct_and_non_empty() {
        let mut seen = std::collections::HashSet::new();
        for m in Membership::ALL {
            assert!(!m.categories().is_empty());
            let mut cats = m.categories().to_vec();
            cats.sort();
            assert!(seen.insert(cats));
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn test_complete_derives_p123() {
        let table = MembershipTable::complete([0.25, 0.35, 0.25, 0.06, 0.03, 0.04]).unwrap();
        assert!((table.probability(Membership::All123) - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_complete_rejects_excess() {
        let err = MembershipTable::complete([0.5, 0.5, 0.1, 0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ConfigError::ProbabilitiesExceedOne { .. }));
    }

    #[test]
    fn test_new_rejects_bad_sum() {
        let err = MembershipTable::new([0.5, 0.1, 0.1, 0.0, 0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ConfigError::ProbabilitySum { .. }));
    }

    #[test]
    fn test_new_rejects_negative() {
        let err = MembershipTable::new([1.1, -0.1, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProbability { name: "p1", .. }));
    }

    #[test]
    fn test_category_probability() {
        let table = MembershipTable::new(PROBS).unwrap();
        let p1 = table.category_probability(Category::One);
        assert!((p1 - (0.25 + 0.06 + 0.03 + 0.02)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_probability_never_drawn() {
        let table = MembershipTable::new([0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            let m = table.draw(&mut rng);
            assert!(matches!(m, Membership::Only1 | Membership::Only2));
        }
    }

    #[test]
    fn test_draw_converges_to_probabilities() {
        let table = MembershipTable::new(PROBS).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let draws = 200_000;
        let mut counts = [0u64; 7];
        for _ in 0..draws {
            let m = table.draw(&mut rng);
            let pos = Membership::ALL.iter().position(|x| *x == m).unwrap();
            counts[pos] += 1;
        }

        for (pos, &p) in PROBS.iter().enumerate() {
            let expected = p * draws as f64;
            let sd = (draws as f64 * p * (1.0 - p)).sqrt();
            let diff = (counts[pos] as f64 - expected).abs();
            assert!(diff < 5.0 * sd, "subset {} off by {} (sd {})", pos, diff, sd);
        }
    }
}
