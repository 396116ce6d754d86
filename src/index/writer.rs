//! Index log writer
//!
//! Appends entries to the index log file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::IndexEntry;

/// Writes entries to the index log, syncing each one
pub struct IndexLogWriter {
    /// Path of the log file
    path: PathBuf,
    /// Append-mode handle
    file: File,
    /// Entries appended through this writer
    entries_written: u64,
}

impl IndexLogWriter {
    /// Open or create an index log for appending
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            entries_written: 0,
        })
    }

    /// Append one entry; returns once it is synced to disk
    pub fn append(&mut self, entry: &IndexEntry) -> Result<()> {
        self.file.write_all(&entry.serialize())?;
        self.file.sync_data()?;
        self.entries_written += 1;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Entries appended through this writer
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
