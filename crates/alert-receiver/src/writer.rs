//! Day-partitioned append-only log files.
//!
//! Each record is written with one `write_all` on an unbuffered handle opened
//! in append mode, so concurrent writers never interleave within a line.
//! The file is opened and closed once per record.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{WriteError, WriteResult};
use crate::record::LogRecord;

/// File name prefix.
pub const FILE_PREFIX: &str = "app_hivemq_";

/// Fixed sequence suffix after the date.
pub const FILE_SUFFIX: &str = "0001";

/// File extension.
pub const FILE_EXTENSION: &str = "log";

/// Name of the log file for `date`, e.g. `app_hivemq_202403050001.log`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!(
        "{FILE_PREFIX}{}{FILE_SUFFIX}.{FILE_EXTENSION}",
        date.format("%Y%m%d")
    )
}

/// Full path of the log file for `date` inside `dir`.
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(log_file_name(date))
}

/// Appends log records to the file for the day they are processed.
#[derive(Debug)]
pub struct LogWriter {
    dir: PathBuf,
    failed_writes: AtomicU64,
}

impl LogWriter {
    /// Create a writer for files in `dir`. The directory is not created.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            failed_writes: AtomicU64::new(0),
        }
    }

    /// Directory the log files live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file records for `date` go to.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        log_file_path(&self.dir, date)
    }

    /// Number of appends that failed since the writer was created.
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Append `record` to the file for `date`.
    ///
    /// Returns the path written to. Failures are counted.
    pub fn append(&self, record: &LogRecord, date: NaiveDate) -> WriteResult<PathBuf> {
        let result = self.try_append(record, date);
        if result.is_err() {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn try_append(&self, record: &LogRecord, date: NaiveDate) -> WriteResult<PathBuf> {
        let line = record.to_line()?;
        let path = self.path_for(date);

        let mut file = open_append(&path).map_err(|source| WriteError::Open {
            path: path.clone(),
            source,
        })?;
        file.write_all(&line).map_err(|source| WriteError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), bytes = line.len(), "appended log record");
        Ok(path)
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}
