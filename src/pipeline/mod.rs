//! Pipeline orchestration
//!
//! ```text
//!                      ┌────────────────────────────┐
//!                      │        Pipeline            │
//!                      └─────────────┬──────────────┘
//!                                    │
//!        GENERATE (min(shards, workers) threads)
//!   ┌──────────┐  ┌──────────┐              ┌──────────┐
//!   │ shard 0  │  │ shard 1  │     ...      │ shard N  │
//!   └────┬─────┘  └────┬─────┘              └────┬─────┘
//!        └──── work/t<id>/list{1,2,3}.tsv ───────┘
//!                                    │
//!        MERGE (3 threads)           ▼
//!        list1.tsv   list2.tsv   list3.tsv
//!                                    │
//!        SAMPLE (3 threads)          ▼
//!        sample1.tsv sample2.tsv sample3.tsv
//!                                    │
//!        CLEANUP                     ▼
//!        remove work/
//! ```

pub mod layout;
pub mod orchestrator;
pub mod pool;
pub mod seed;

pub use layout::OutputLayout;
pub use orchestrator::{CategoryReport, Phase, PhaseDurations, Pipeline, PipelineReport};
pub use pool::{Task, TaskPool};
pub use seed::{task_rng, TaskStream};
