//! Per-shard population generation

use crate::cancel::CancelToken;
use crate::error::{ShardError, ShardResult};
use crate::generator::identifier::generate_identifier;
use crate::generator::score::ScoreSampler;
use crate::membership::{Category, MembershipTable};
use crate::record::Record;
use rand::Rng;

/// The three per-category record lists of one shard, in generation order
#[derive(Debug, Default)]
pub struct ShardBuffers {
    lists: [Vec<Record>; 3],
    identifiers: u64,
}

impl ShardBuffers {
    /// Records of one category
    pub fn list(&self, category: Category) -> &[Record] {
        &self.lists[category.index()]
    }

    /// Mutable records of one category
    pub fn list_mut(&mut self, category: Category) -> &mut Vec<Record> {
        &mut self.lists[category.index()]
    }

    /// Number of identifiers generated (each belongs to at least one list)
    pub fn identifiers(&self) -> u64 {
        self.identifiers
    }

    /// Row count per category
    pub fn counts(&self) -> [u64; 3] {
        [
            self.lists[0].len() as u64,
            self.lists[1].len() as u64,
            self.lists[2].len() as u64,
        ]
    }

    /// Consume into the per-category lists
    pub fn into_lists(self) -> [Vec<Record>; 3] {
        self.lists
    }
}

/// Generate `size` identifiers and their category memberships
///
/// One membership subset is drawn per identifier; every category in the
/// subset gets an independently drawn score.
pub fn generate_population<R: Rng + ?Sized>(
    size: u64,
    table: &MembershipTable,
    rng: &mut R,
    cancel: &CancelToken,
) -> ShardResult<ShardBuffers> {
    let scores = ScoreSampler::new();
    let mut buffers = ShardBuffers::default();

    for category in Category::ALL {
        let expected = (size as f64 * table.category_probability(category)) as usize;
        buffers.list_mut(category).reserve(expected);
    }

    for n in 0..size {
        if cancel.should_stop(n) {
            return Err(ShardError::Cancelled);
        }

        let identifier = generate_identifier(rng);
        let membership = table.draw(rng);
        if let Some((&last, rest)) = membership.categories().split_last() {
            for &category in rest {
                let score = scores.draw(rng);
                buffers
                    .list_mut(category)
                    .push(Record::new(identifier.clone(), score));
            }
            let score = scores.draw(rng);
            buffers.list_mut(last).push(Record::new(identifier, score));
        }

        buffers.identifiers += 1;
    }

    Ok(buffers)
}

/// Split `total` identifiers over `shards` shards
///
/// The remainder goes one extra identifier each to the first shards, so
/// sizes sum to exactly `total`.
pub fn split_population(total: u64, shards: usize) -> Vec<u64> {
    if shards == 0 {
        return Vec::new();
    }

    let shards_u64 = shards as u64;
    let base = total / shards_u64;
    let remainder = total % shards_u64;

    (0..shards_u64)
        .map(|i| base + u64::from(i < remainder))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::Membership;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const PROBS: [f64; 7] = [0.25, 0.35, 0.25, 0.06, 0.03, 0.04, 0.02];

    #[test]
    fn test_split_population() {
        assert_eq!(split_population(10, 3), vec![4, 3, 3]);
        assert_eq!(split_population(9, 3), vec![3, 3, 3]);
        assert_eq!(split_population(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(split_population(1_000, 4).iter().sum::<u64>(), 1_000);
        assert!(split_population(5, 0).is_empty());
    }

    #[test]
    fn test_single_category_membership() {
        let table = MembershipTable::new([0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let buffers = generate_population(500, &table, &mut rng, &CancelToken::new()).unwrap();

        assert_eq!(buffers.counts(), [0, 500, 0]);
        assert_eq!(buffers.identifiers(), 500);
    }

    #[test]
    fn test_triple_membership_shares_identifier() {
        let table = MembershipTable::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let buffers = generate_population(50, &table, &mut rng, &CancelToken::new()).unwrap();

        assert_eq!(buffers.counts(), [50, 50, 50]);
        for i in 0..50 {
            let id = &buffers.list(Category::One)[i].identifier;
            assert_eq!(id, &buffers.list(Category::Two)[i].identifier);
            assert_eq!(id, &buffers.list(Category::Three)[i].identifier);
            assert_eq!(id.len(), 26);
        }
    }

    #[test]
    fn test_category_counts_converge() {
        let table = MembershipTable::new(PROBS).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let users = 200_000u64;
        let buffers = generate_population(users, &table, &mut rng, &CancelToken::new()).unwrap();

        for category in Category::ALL {
            let p = table.category_probability(category);
            let expected = p * users as f64;
            let sd = (users as f64 * p * (1.0 - p)).sqrt();
            let got = buffers.list(category).len() as f64;
            assert!((got - expected).abs() < 5.0 * sd, "category {} got {}", category, got);
        }

        // category-1-only share: identifiers in list 1 but neither 2 nor 3
        let in_two: std::collections::HashSet<&str> = buffers
            .list(Category::Two)
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        let in_three: std::collections::HashSet<&str> = buffers
            .list(Category::Three)
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        let only_one = buffers
            .list(Category::One)
            .iter()
            .filter(|r| !in_two.contains(r.identifier.as_str()) && !in_three.contains(r.identifier.as_str()))
            .count() as f64;
        let p1 = table.probability(Membership::Only1);
        let sd = (users as f64 * p1 * (1.0 - p1)).sqrt();
        assert!((only_one - p1 * users as f64).abs() < 5.0 * sd);
    }

    #[test]
    fn test_cancelled_generation() {
        let table = MembershipTable::new(PROBS).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = generate_population(10_000, &table, &mut rng, &cancel);
        assert!(matches!(result, Err(ShardError::Cancelled)));
    }

    #[test]
    fn test_same_seed_same_population() {
        let table = MembershipTable::new(PROBS).unwrap();
        let cancel = CancelToken::new();
        let a = generate_population(300, &table, &mut ChaCha8Rng::seed_from_u64(8), &cancel).unwrap();
        let b = generate_population(300, &table, &mut ChaCha8Rng::seed_from_u64(8), &cancel).unwrap();
        assert_eq!(a.into_lists(), b.into_lists());
    }
}
