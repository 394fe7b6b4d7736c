//! Shard persistence
//!
//! Each generation task sorts its three category lists by descending score
//! and publishes them as `work/t<shard_id>/list{1,2,3}.tsv`. A
//! [`ShardFile`] is only handed out after its file has been published, so
//! the merge phase never sees a partially written shard.

pub mod writer;

pub use writer::{sort_by_score_desc, write_shard, ShardFile, ShardOutput};
