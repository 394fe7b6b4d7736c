//! Exact-count sampling without replacement

use crate::cancel::CancelToken;
use crate::error::{SampleError, SampleResult};
use crate::publish::PendingFile;
use crate::sample::validate_rate;
use rand::seq::index;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// `round(rate * total)`, never more than `total`
pub fn target_count(rate: f64, total: u64) -> u64 {
    let target = (rate * total as f64).round();
    if target <= 0.0 {
        0
    } else {
        (target as u64).min(total)
    }
}

/// Count non-empty rows of a list file
pub fn count_rows(src: &Path) -> SampleResult<u64> {
    let reader = open(src)?;
    let mut rows = 0u64;
    for line in reader.lines() {
        let line = line.map_err(|source| SampleError::Read {
            path: src.to_path_buf(),
            source,
        })?;
        if !line.is_empty() {
            rows += 1;
        }
    }
    Ok(rows)
}

/// Write exactly `target_count(rate, total_rows)` distinct rows of `src`
///
/// Row indices are drawn uniformly without replacement from
/// `[0, total_rows)`, then the source is streamed once and the drawn rows
/// are emitted in source order.
pub fn exact_count_sample<R: Rng + ?Sized>(
    src: &Path,
    dest: &Path,
    rate: f64,
    total_rows: u64,
    rng: &mut R,
    cancel: &CancelToken,
) -> SampleResult<u64> {
    validate_rate(rate)?;

    let target = target_count(rate, total_rows);
    let mut selected = if target == 0 {
        Vec::new()
    } else {
        index::sample(rng, to_usize(total_rows), to_usize(target)).into_vec()
    };
    selected.sort_unstable();

    let reader = open(src)?;
    let write_err = |source| SampleError::Write {
        path: dest.to_path_buf(),
        source,
    };
    let mut out = PendingFile::create(dest).map_err(write_err)?;

    let mut wanted = selected.iter().copied().peekable();
    let mut row = 0usize;

    for line in reader.lines() {
        let Some(&next) = wanted.peek() else { break };

        if cancel.should_stop(row as u64) {
            return Err(SampleError::Cancelled);
        }

        let line = line.map_err(|source| SampleError::Read {
            path: src.to_path_buf(),
            source,
        })?;
        if line.is_empty() {
            continue;
        }

        if row == next {
            out.write_line(&line).map_err(write_err)?;
            wanted.next();
        }
        row += 1;
    }

    if wanted.peek().is_some() {
        return Err(SampleError::RowCountMismatch {
            path: src.to_path_buf(),
            expected: total_rows,
            found: row as u64,
        });
    }

    out.publish().map_err(write_err)
}

fn open(src: &Path) -> SampleResult<BufReader<File>> {
    File::open(src)
        .map(BufReader::new)
        .map_err(|source| SampleError::Open {
            path: src.to_path_buf(),
            source,
        })
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
