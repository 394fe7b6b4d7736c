//! Independent per-row inclusion

use crate::cancel::CancelToken;
use crate::error::{SampleError, SampleResult};
use crate::publish::PendingFile;
use crate::sample::validate_rate;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Keep each row of `src` with probability `rate`
pub fn bernoulli_sample<R: Rng + ?Sized>(
    src: &Path,
    dest: &Path,
    rate: f64,
    rng: &mut R,
    cancel: &CancelToken,
) -> SampleResult<u64> {
    validate_rate(rate)?;

    let reader = File::open(src)
        .map(BufReader::new)
        .map_err(|source| SampleError::Open {
            path: src.to_path_buf(),
            source,
        })?;

    let write_err = |source| SampleError::Write {
        path: dest.to_path_buf(),
        source,
    };
    let mut out = PendingFile::create(dest).map_err(write_err)?;

    for (n, line) in reader.lines().enumerate() {
        if cancel.should_stop(n as u64) {
            return Err(SampleError::Cancelled);
        }

        let line = line.map_err(|source| SampleError::Read {
            path: src.to_path_buf(),
            source,
        })?;
        if line.is_empty() {
            continue;
        }

        if rng.gen_bool(rate) {
            out.write_line(&line).map_err(write_err)?;
        }
    }

    out.publish().map_err(write_err)
}
