//! Data heap file
//!
//! Fixed-stride record storage with positioned, synced I/O.

use std::fs::{File, OpenOptions};
use std::io;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::record::{DELETED_AT_OFFSET, RECORD_LEN};

const STRIDE: u64 = RECORD_LEN as u64;

/// The data heap
pub struct DataHeap {
    /// Path of the heap file
    path: PathBuf,
    /// Open read/write handle; only ever used with positioned I/O
    file: File,
    /// Current end of the heap (always a multiple of `RECORD_LEN`)
    len: AtomicU64,
    /// Held across an append so concurrent appenders get distinct offsets
    append_lock: Mutex<()>,
}

impl DataHeap {
    /// Open or create the heap file
    ///
    /// A trailing partial record (torn append) is cut off so that every
    /// record keeps starting at a multiple of `RECORD_LEN`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let file_len = file.metadata()?.len();
        let len = file_len - file_len % STRIDE;
        if len != file_len {
            tracing::warn!(
                path = %path.display(),
                file_len,
                truncated_to = len,
                "Data heap ends in a partial record, truncating"
            );
            file.set_len(len)?;
            file.sync_all()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len: AtomicU64::new(len),
            append_lock: Mutex::new(()),
        })
    }

    /// Append one encoded record; returns its starting offset
    pub fn append(&self, encoded: &[u8]) -> Result<u64> {
        if encoded.len() != RECORD_LEN {
            return Err(StoreError::CorruptRecord(format!(
                "refusing to append {} bytes, records are {} bytes",
                encoded.len(),
                RECORD_LEN
            )));
        }

        let _guard = self.append_lock.lock();
        let offset = self.len.load(Ordering::Acquire);
        write_all_at(&self.file, encoded, offset)?;
        self.file.sync_data()?;
        self.len.store(offset + STRIDE, Ordering::Release);

        tracing::trace!(offset, "Appended record to data heap");
        Ok(offset)
    }

    /// Overwrite the deleted-at field of the record at `offset`
    ///
    /// Touches only the 8 bytes at `offset + 16`.
    pub fn mark_deleted(&self, offset: u64, timestamp: NonZeroU64) -> Result<()> {
        self.check_offset(offset)?;
        write_all_at(
            &self.file,
            &timestamp.get().to_le_bytes(),
            offset + DELETED_AT_OFFSET,
        )?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Read exactly one encoded record starting at `offset`
    pub fn read_at(&self, offset: u64) -> Result<Vec<u8>> {
        self.check_offset(offset)?;
        let mut buf = vec![0u8; RECORD_LEN];
        read_exact_at(&self.file, &mut buf, offset).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                StoreError::CorruptRecord(format!("short read at offset {}", offset))
            }
            _ => StoreError::Io(e),
        })?;
        Ok(buf)
    }

    /// Read up to `max_records` whole records starting at `offset`
    ///
    /// Returns an empty buffer at end of heap.
    pub fn read_chunk(&self, offset: u64, max_records: usize) -> Result<Vec<u8>> {
        let end = self.len();
        if offset >= end {
            return Ok(Vec::new());
        }
        let want = (end - offset).min(max_records as u64 * STRIDE);
        let mut buf = vec![0u8; want as usize];
        read_exact_at(&self.file, &mut buf, offset)?;
        Ok(buf)
    }

    /// Current heap length in bytes
    pub fn len(&self) -> u64 {
        self.len.load(Ordering::Acquire)
    }

    /// Whether the heap holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records on the heap, tombstoned ones included
    pub fn record_count(&self) -> u64 {
        self.len() / STRIDE
    }

    /// Force file contents and metadata to disk
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Path of the heap file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_offset(&self, offset: u64) -> Result<()> {
        let past_end = offset
            .checked_add(STRIDE)
            .map_or(true, |end| end > self.len());
        if offset % STRIDE != 0 || past_end {
            return Err(StoreError::CorruptRecord(format!(
                "offset {} is not a record boundary within the heap (len {})",
                offset,
                self.len()
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Positioned I/O
// =============================================================================

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut read = 0;
    while read < buf.len() {
        let n = file.seek_read(&mut buf[read..], offset + read as u64)?;
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        read += n;
    }
    Ok(())
}

#[cfg(windows)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut written = 0;
    while written < buf.len() {
        let n = file.seek_write(&buf[written..], offset + written as u64)?;
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::WriteZero));
        }
        written += n;
    }
    Ok(())
}
