//! External k-way merge
//!
//! Merges N files that are each sorted by non-increasing score into one
//! globally sorted file. Memory is O(N): one open reader and one pending
//! line per input, independent of row count.
//!
//! ```text
//!   t0/listK.tsv ──► cursor 0 ─┐
//!   t1/listK.tsv ──► cursor 1 ─┼──► max pending score ──► listK.tsv
//!        ...                   │    (first cursor wins ties)
//!   tN/listK.tsv ──► cursor N ─┘
//! ```
//!
//! Selection is a linear scan rather than a heap; N is the shard count,
//! which stays small.

pub mod cursor;
pub mod engine;

pub use cursor::MergeCursor;
pub use engine::{merge_files, select_max};
