//! Write-then-publish output files
//!
//! Every file the pipeline produces is first written to a `.partial`
//! sibling, flushed and synced, then renamed into place. Readers therefore
//! only ever see complete files. A [`PendingFile`] dropped without
//! [`PendingFile::publish`] removes its partial file.

use crate::record::Record;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Write buffer size for list files
const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// An output file being written, not yet visible under its final name
pub struct PendingFile {
    final_path: PathBuf,
    partial_path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows: u64,
}

impl PendingFile {
    /// Create the partial file for `final_path`
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let partial_path = partial_path_for(final_path);
        let file = File::create(&partial_path)?;

        Ok(Self {
            final_path: final_path.to_path_buf(),
            partial_path,
            writer: Some(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file)),
            rows: 0,
        })
    }

    /// Append one line (newline is added)
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let writer = self.writer()?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    /// Append one record
    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        let writer = self.writer()?;
        writeln!(writer, "{}\t{}", record.identifier, record.score)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Final path this file will be published to
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Flush, sync and rename into place; returns the row count
    pub fn publish(mut self) -> io::Result<u64> {
        let writer = self.writer.take().ok_or_else(closed)?;
        if let Err(e) = finish(writer, &self.partial_path, &self.final_path) {
            let _ = fs::remove_file(&self.partial_path);
            return Err(e);
        }

        trace!(path = %self.final_path.display(), rows = self.rows, "Published");
        Ok(self.rows)
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer.as_mut().ok_or_else(closed)
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.partial_path);
        }
    }
}

fn finish(writer: BufWriter<File>, partial: &Path, target: &Path) -> io::Result<()> {
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);
    fs::rename(partial, target)
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "pending file already closed")
}

/// `list1.tsv` -> `list1.tsv.partial`
pub fn partial_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
