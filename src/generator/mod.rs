//! Synthetic population generation
//!
//! Produces identifiers, draws each identifier's membership subset and
//! one affinity score per category it belongs to.
//!
//! ```text
//!   identifier ──► MembershipTable::draw ──► {1} {2} {3} {1,2} {1,3} {2,3} {1,2,3}
//!                                                   │
//!                           for each category ◄─────┘
//!                                   │
//!                                   ▼
//!                        Beta(1,3) score, 3 digits
//!                                   │
//!                                   ▼
//!                  ShardBuffers[category].push(identifier, score)
//! ```

pub mod identifier;
pub mod population;
pub mod score;

pub use identifier::{generate_identifier, IDENTIFIER_ALPHABET, IDENTIFIER_LEN};
pub use population::{generate_population, split_population, ShardBuffers};
pub use score::ScoreSampler;
