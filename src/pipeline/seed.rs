//! Per-task random sources
//!
//! Every task gets its own ChaCha8 generator, seeded from the run seed
//! and placed on a distinct stream. Runs with the same seed and shard
//! count reproduce the same files regardless of thread scheduling.

use crate::membership::Category;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Which task a random stream belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStream {
    /// Generation task of one shard
    Shard(usize),
    /// Sampling task of one category
    Sample(Category),
}

impl TaskStream {
    fn id(self) -> u64 {
        match self {
            TaskStream::Shard(id) => id as u64,
            TaskStream::Sample(category) => (1u64 << 32) + category.number() as u64,
        }
    }
}

/// Random generator for one task of a run
pub fn task_rng(seed: u64, stream: TaskStream) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream.id());
    rng
}
