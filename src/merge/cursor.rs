//! Read cursor over one sorted input

use crate::error::{MergeError, MergeResult};
use crate::record::{parse_score, Score};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Read buffer size per input
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Holds the next unconsumed line of one input and its parsed score
pub struct MergeCursor {
    path: PathBuf,
    reader: BufReader<File>,
    line_no: u64,
    pending: Option<(String, Score)>,
    previous: Option<Score>,
}

impl MergeCursor {
    /// Open an input and load its first line
    pub fn open(path: &Path) -> MergeResult<Self> {
        let file = File::open(path).map_err(|source| MergeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut cursor = Self {
            path: path.to_path_buf(),
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, file),
            line_no: 0,
            pending: None,
            previous: None,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    /// Score of the pending line, `None` once exhausted
    pub fn score(&self) -> Option<Score> {
        self.pending.as_ref().map(|(_, score)| *score)
    }

    /// Pending line without newline
    pub fn line(&self) -> Option<&str> {
        self.pending.as_ref().map(|(line, _)| line.as_str())
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_none()
    }

    /// Load the next line, verifying the input stays non-increasing
    pub fn advance(&mut self) -> MergeResult<()> {
        // reuse the buffer of the consumed line
        let mut buf = match self.pending.take() {
            Some((mut line, _)) => {
                line.clear();
                line
            }
            None => String::new(),
        };

        loop {
            let read = self
                .reader
                .read_line(&mut buf)
                .map_err(|source| MergeError::Read {
                    path: self.path.clone(),
                    source,
                })?;

            if read == 0 {
                return Ok(());
            }
            self.line_no += 1;

            let trimmed_len = buf.trim_end_matches(['\r', '\n']).len();
            buf.truncate(trimmed_len);

            // tolerate blank lines (e.g. a trailing empty line)
            if !buf.is_empty() {
                break;
            }
        }

        let score = parse_score(&buf).map_err(|reason| MergeError::MalformedLine {
            path: self.path.clone(),
            line: self.line_no,
            reason,
        })?;

        if let Some(previous) = self.previous {
            if score > previous {
                return Err(MergeError::UnsortedInput {
                    path: self.path.clone(),
                    line: self.line_no,
                    previous: previous.to_string(),
                    found: score.to_string(),
                });
            }
        }

        self.previous = Some(score);
        self.pending = Some((buf, score));
        Ok(())
    }
}
