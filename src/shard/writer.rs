//! Sorted shard writer

use crate::cancel::CancelToken;
use crate::error::{ShardError, ShardResult};
use crate::generator::ShardBuffers;
use crate::membership::Category;
use crate::publish::PendingFile;
use crate::record::Record;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A published, locally sorted shard file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardFile {
    category: Category,
    path: PathBuf,
    rows: u64,
}

impl ShardFile {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }
}

/// The three shard files written by one generation task
#[derive(Debug, Clone)]
pub struct ShardOutput {
    pub shard_id: usize,
    pub identifiers: u64,
    pub files: [ShardFile; 3],
}

impl ShardOutput {
    /// Shard file of one category
    pub fn file(&self, category: Category) -> &ShardFile {
        &self.files[category.index()]
    }
}

/// Sort by descending score; equal scores keep generation order
pub fn sort_by_score_desc(records: &mut [Record]) {
    // stable sort: ties stay in insertion order
    records.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Sort and publish the three category lists of one shard into `dir`
pub fn write_shard(
    shard_id: usize,
    buffers: ShardBuffers,
    dir: &Path,
    cancel: &CancelToken,
) -> ShardResult<ShardOutput> {
    fs::create_dir_all(dir).map_err(|source| ShardError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let identifiers = buffers.identifiers();
    let [l1, l2, l3] = buffers.into_lists();

    let files = [
        write_category(shard_id, Category::One, l1, dir, cancel)?,
        write_category(shard_id, Category::Two, l2, dir, cancel)?,
        write_category(shard_id, Category::Three, l3, dir, cancel)?,
    ];

    Ok(ShardOutput {
        shard_id,
        identifiers,
        files,
    })
}

fn write_category(
    shard_id: usize,
    category: Category,
    mut records: Vec<Record>,
    dir: &Path,
    cancel: &CancelToken,
) -> ShardResult<ShardFile> {
    let path = dir.join(format!("list{}.tsv", category.number()));
    let write_err = |source| ShardError::Write {
        path: path.clone(),
        source,
    };

    sort_by_score_desc(&mut records);

    let mut pending = PendingFile::create(&path).map_err(write_err)?;
    for (n, record) in records.iter().enumerate() {
        if cancel.should_stop(n as u64) {
            return Err(ShardError::Cancelled);
        }
        pending.write_record(record).map_err(write_err)?;
    }

    let rows = pending.publish().map_err(|source| ShardError::Publish {
        path: path.clone(),
        source,
    })?;

    debug!(shard = shard_id, category = %category, rows, "Shard file published");

    Ok(ShardFile {
        category,
        path,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MembershipTable;
    use crate::generator::generate_population;
    use crate::record::{parse_line, Score};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::tempdir;

    #[test]
    fn test_sort_is_stable_on_ties() {
        let mut records = vec![
            Record::new("A", Score::from_millis(100)),
            Record::new("B", Score::from_millis(300)),
            Record::new("C", Score::from_millis(100)),
            Record::new("D", Score::from_millis(300)),
        ];
        sort_by_score_desc(&mut records);

        let ids: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_write_shard_sorted_files() {
        let dir = tempdir().unwrap();
        let shard_dir = dir.path().join("work").join("t3");
        let table = MembershipTable::new([0.25, 0.35, 0.25, 0.06, 0.03, 0.04, 0.02]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let cancel = CancelToken::new();
        let buffers = generate_population(2_000, &table, &mut rng, &cancel).unwrap();
        let counts = buffers.counts();

        let output = write_shard(3, buffers, &shard_dir, &cancel).unwrap();
        assert_eq!(output.shard_id, 3);
        assert_eq!(output.identifiers, 2_000);

        for category in Category::ALL {
            let file = output.file(category);
            assert_eq!(file.category(), category);
            assert_eq!(file.rows(), counts[category.index()]);
            assert_eq!(
                file.path(),
                shard_dir.join(format!("list{}.tsv", category.number()))
            );

            let content = fs::read_to_string(file.path()).unwrap();
            let scores: Vec<Score> = content
                .lines()
                .map(|l| parse_line(l).unwrap().score)
                .collect();
            assert_eq!(scores.len() as u64, file.rows());
            assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_write_shard_empty_category() {
        let dir = tempdir().unwrap();
        let mut buffers = ShardBuffers::default();
        buffers
            .list_mut(Category::One)
            .push(Record::new("ONLY", Score::from_millis(10)));

        let output = write_shard(0, buffers, dir.path(), &CancelToken::new()).unwrap();
        assert_eq!(output.file(Category::One).rows(), 1);
        assert_eq!(output.file(Category::Two).rows(), 0);
        assert!(output.file(Category::Two).path().exists());
    }

    #[test]
    fn test_write_shard_dir_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a dir").unwrap();

        let result = write_shard(0, ShardBuffers::default(), &blocker.join("t0"), &CancelToken::new());
        assert!(matches!(result, Err(ShardError::CreateDir { .. })));
    }
}
