//! On-disk layout of a run
//!
//! ```text
//! <output>/
//! ├── work/
//! │   ├── t0/list{1,2,3}.tsv
//! │   └── tN/list{1,2,3}.tsv
//! ├── list{1,2,3}.tsv
//! └── sample{1,2,3}.tsv
//! ```

use crate::membership::Category;
use std::path::{Path, PathBuf};

/// Paths of every file a run reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    base: PathBuf,
}

impl OutputLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Output directory
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Intermediate work tree, removed after a successful run
    pub fn work_dir(&self) -> PathBuf {
        self.base.join("work")
    }

    /// Directory owned by one generation task
    pub fn shard_dir(&self, shard_id: usize) -> PathBuf {
        self.work_dir().join(format!("t{}", shard_id))
    }

    /// Shard file of one (shard, category)
    pub fn shard_file(&self, shard_id: usize, category: Category) -> PathBuf {
        self.shard_dir(shard_id)
            .join(format!("list{}.tsv", category.number()))
    }

    /// Merged, globally ranked list of a category
    pub fn list_file(&self, category: Category) -> PathBuf {
        self.base.join(format!("list{}.tsv", category.number()))
    }

    /// Sample of a category list
    pub fn sample_file(&self, category: Category) -> PathBuf {
        self.base.join(format!("sample{}.tsv", category.number()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.work_dir(), PathBuf::from("/out/work"));
        assert_eq!(
            layout.shard_file(7, Category::Two),
            PathBuf::from("/out/work/t7/list2.tsv")
        );
        assert_eq!(layout.list_file(Category::One), PathBuf::from("/out/list1.tsv"));
        assert_eq!(layout.sample_file(Category::Three), PathBuf::from("/out/sample3.tsv"));
    }
}
