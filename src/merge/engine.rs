//! Merge driver

use crate::cancel::CancelToken;
use crate::error::{MergeError, MergeResult};
use crate::merge::cursor::MergeCursor;
use crate::publish::PendingFile;
use crate::record::Score;
use std::path::Path;
use tracing::debug;

/// Index of the cursor with the highest pending score
///
/// Exhausted cursors are skipped. On equal scores the lowest index wins.
/// Returns `None` when every cursor is exhausted.
pub fn select_max(scores: impl IntoIterator<Item = Option<Score>>) -> Option<usize> {
    let mut best: Option<(usize, Score)> = None;

    for (idx, score) in scores.into_iter().enumerate() {
        let Some(score) = score else { continue };
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }

    best.map(|(idx, _)| idx)
}

/// Merge pre-sorted inputs into `dest`, returning the number of rows written
///
/// Every input must be sorted by non-increasing score; a violation aborts
/// the merge with [`MergeError::UnsortedInput`]. The output is published
/// only after every input is exhausted, so a failed merge leaves no
/// `dest` behind.
pub fn merge_files<P: AsRef<Path>>(
    inputs: &[P],
    dest: &Path,
    cancel: &CancelToken,
) -> MergeResult<u64> {
    if inputs.is_empty() {
        return Err(MergeError::NoInputs);
    }

    let mut cursors = inputs
        .iter()
        .map(|p| MergeCursor::open(p.as_ref()))
        .collect::<MergeResult<Vec<_>>>()?;

    let write_err = |source| MergeError::Write {
        path: dest.to_path_buf(),
        source,
    };

    let mut out = PendingFile::create(dest).map_err(write_err)?;

    while let Some(idx) = select_max(cursors.iter().map(MergeCursor::score)) {
        if cancel.should_stop(out.rows()) {
            return Err(MergeError::Cancelled);
        }

        let cursor = &mut cursors[idx];
        if let Some(line) = cursor.line() {
            out.write_line(line).map_err(write_err)?;
        }
        cursor.advance()?;
    }

    let rows = out.publish().map_err(write_err)?;

    debug!(
        inputs = inputs.len(),
        rows,
        dest = %dest.display(),
        "Merge complete"
    );

    Ok(rows)
}
