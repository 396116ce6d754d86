//! Index log recovery
//!
//! Rebuilds the in-memory index by replaying the index log.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{Result, StoreError};

use super::{IndexLogReader, MemIndex};

/// Replays the index log after (re)open
pub struct IndexRecovery;

/// Result of a recovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Entries applied to the index
    pub entries_replayed: u64,

    /// Bytes after the last good entry (torn or corrupt tail)
    pub discarded_bytes: u64,

    /// Whether the log file was cut back to the last good entry
    pub was_truncated: bool,
}

impl IndexRecovery {
    /// Replay the log at `path` into a fresh index
    ///
    /// This will:
    /// 1. Apply every complete, checksummed entry in log order
    /// 2. Stop at the first partial or corrupt entry
    /// 3. Truncate the file to the end of the last good entry
    ///
    /// A missing file yields an empty index.
    pub fn recover(path: &Path) -> Result<(MemIndex, RecoveryResult)> {
        let mut index = MemIndex::new();
        if !path.exists() {
            return Ok((index, RecoveryResult::default()));
        }

        let (good_len, entries_replayed) = Self::replay(path, |entry| index.apply(&entry))?;
        let file_len = std::fs::metadata(path)?.len();

        let mut result = RecoveryResult {
            entries_replayed,
            discarded_bytes: file_len - good_len,
            was_truncated: false,
        };

        if result.discarded_bytes > 0 {
            tracing::warn!(
                path = %path.display(),
                good_len,
                discarded = result.discarded_bytes,
                "Index log has a torn or corrupt tail, truncating"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(good_len)?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        tracing::info!(
            entries = result.entries_replayed,
            live = index.live_count(),
            discarded_bytes = result.discarded_bytes,
            "Index log replayed"
        );

        Ok((index, result))
    }

    /// Inspect a log without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (good_len, entries_replayed) = Self::replay(path, |_| {})?;
        let file_len = std::fs::metadata(path)?.len();

        Ok(RecoveryResult {
            entries_replayed,
            discarded_bytes: file_len - good_len,
            was_truncated: false,
        })
    }

    /// Feed every good entry to `apply`; returns (good length, entry count)
    fn replay(path: &Path, mut apply: impl FnMut(super::IndexEntry)) -> Result<(u64, u64)> {
        let mut reader = IndexLogReader::open(path)?;
        let mut count = 0u64;

        loop {
            match reader.next_entry() {
                Ok(Some(entry)) => {
                    apply(entry);
                    count += 1;
                }
                Ok(None) => break,
                Err(StoreError::IndexLog(reason)) => {
                    tracing::debug!(%reason, position = reader.position(), "Replay stopped");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((reader.position(), count))
    }
}
