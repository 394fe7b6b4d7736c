//! userlist-gen - Synthetic Ranked User List Generator
//!
//! Generates a synthetic population of unique identifiers spread over three
//! overlapping categories, produces one globally ranked list per category
//! and a random sample of each list.
//!
//! # Features
//!
//! - **Overlapping Categories**: every identifier is assigned one of the 7
//!   non-empty category subsets with configurable probabilities.
//!
//! - **Parallel Generation**: the population is split into shards that are
//!   generated and sorted concurrently, each with its own seeded RNG.
//!
//! - **External Merge**: shard files are merged by a streaming k-way merge,
//!   so memory stays flat regardless of population size.
//!
//! - **Sampling**: Bernoulli or exact-count sampling of every merged list.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    MembershipTable + Beta(1,3)                   │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Generation Threads                           │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │ Shard 0 │  │ Shard 1 │  │ Shard 2 │  ...    │ Shard N │     │
//! │  │ ChaCha8 │  │ ChaCha8 │  │ ChaCha8 │         │ ChaCha8 │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       └────────────┴─────┬──────┴────────────────────┘          │
//! │                          ▼                                      │
//! │            work/t<id>/list{1,2,3}.tsv (sorted)                  │
//! └──────────────────────────┬──────────────────────────────────────┘
//!                            │
//!                            ▼
//!              ┌──────────────────────────┐
//!              │   k-way merge (3 tasks)  │ ──► list{1,2,3}.tsv
//!              └────────────┬─────────────┘
//!                           ▼
//!              ┌──────────────────────────┐
//!              │   sampling (3 tasks)     │ ──► sample{1,2,3}.tsv
//!              └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # One million users, 8 shards
//! userlist-gen 0.25 0.35 0.25 0.06 0.03 0.04 0.02 -u 1000000 -s 8 -d output
//!
//! # p123 derived from the other six, Bernoulli sampling
//! userlist-gen 0.25 0.35 0.25 0.06 0.03 0.04 --strategy bernoulli
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod generator;
pub mod membership;
pub mod merge;
pub mod pipeline;
pub mod progress;
pub mod publish;
pub mod record;
pub mod sample;
pub mod shard;

pub use cancel::CancelToken;
pub use config::{CliArgs, PipelineConfig};
pub use error::{PipelineError, Result};
pub use membership::{Category, Membership, MembershipTable};
pub use pipeline::{Phase, Pipeline, PipelineReport};
pub use record::{Record, Score};
pub use sample::SamplingStrategy;
