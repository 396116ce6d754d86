//! Index log reader
//!
//! Sequential reading of entries from the index log.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, StoreError};

use super::{IndexEntry, ENTRY_SIZE};

/// Reads entries from the index log in log order
pub struct IndexLogReader {
    reader: BufReader<File>,
    /// End of the last entry read successfully
    position: u64,
}

impl IndexLogReader {
    /// Open an index log for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry
    ///
    /// Returns:
    /// - `Ok(Some(entry))`: a complete, checksummed entry
    /// - `Ok(None)`: clean end of file
    /// - `Err(IndexLog)`: partial or corrupt entry; `position()` is unchanged
    pub fn next_entry(&mut self) -> Result<Option<IndexEntry>> {
        let mut buf = [0u8; ENTRY_SIZE];
        let mut filled = 0;

        while filled < ENTRY_SIZE {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(StoreError::Io(e)),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < ENTRY_SIZE {
            return Err(StoreError::IndexLog(format!(
                "partial entry of {} bytes at offset {}",
                filled, self.position
            )));
        }

        let entry = IndexEntry::deserialize(&buf)?;
        self.position += ENTRY_SIZE as u64;
        Ok(Some(entry))
    }

    /// Byte position just past the last good entry
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over entries, stopping after the first error
    pub fn entries(self) -> IndexLogIter {
        IndexLogIter {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over index log entries
pub struct IndexLogIter {
    reader: IndexLogReader,
    done: bool,
}

impl IndexLogIter {
    /// Byte position just past the last good entry
    pub fn position(&self) -> u64 {
        self.reader.position()
    }
}

impl Iterator for IndexLogIter {
    type Item = Result<IndexEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
