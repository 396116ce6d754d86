//! Substring scanner
//!
//! Producer side of a search: walks the heap at record stride and pushes
//! matching live records into the result channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam::channel::{self, SendTimeoutError, Sender};

use crate::config::{Config, SearchScope};
use crate::error::{Result, StoreError};
use crate::heap::DataHeap;
use crate::record::{self, UserRecord, RECORD_LEN};
use crate::store::Context;

use super::{SearchStream, POLL_INTERVAL};

/// Why a scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the end of the heap
    Exhausted,
    /// The caller's context was canceled, or the stream was closed early
    Canceled,
    /// The caller's deadline or the scan's run deadline passed
    DeadlineExceeded,
    /// The result stream was dropped
    ConsumerGone,
    /// A heap read failed
    ReadError,
}

/// What one scan did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub records_scanned: u64,
    pub matches: u64,
    pub stop_reason: StopReason,
}

/// One running heap scan
pub struct Scanner {
    heap: Arc<DataHeap>,
    query: Vec<u8>,
    scope: SearchScope,
    chunk_records: usize,
    /// Hard end of the scan
    deadline: Instant,
    ctx: Context,
    /// Raised by the stream when the consumer stops early
    stop: Arc<AtomicBool>,
    results: Sender<UserRecord>,
}

impl Scanner {
    /// Start a scan thread for `query` and return the consumer's stream
    pub fn spawn(
        heap: Arc<DataHeap>,
        query: Vec<u8>,
        config: &Config,
        ctx: Context,
    ) -> Result<SearchStream> {
        let (results, receiver) = channel::bounded(config.search_result_capacity);
        let stop = Arc::new(AtomicBool::new(false));

        let scanner = Scanner {
            heap,
            query,
            scope: config.search_scope,
            chunk_records: config.search_chunk_records,
            deadline: Instant::now() + config.search_run_deadline,
            ctx: ctx.clone(),
            stop: Arc::clone(&stop),
            results,
        };

        let handle = thread::Builder::new()
            .name("userstore-search".to_string())
            .spawn(move || scanner.run())?;

        Ok(SearchStream::new(
            receiver,
            stop,
            ctx,
            config.search_idle_timeout,
            handle,
        ))
    }

    fn run(self) -> ScanSummary {
        let mut records_scanned = 0u64;
        let mut matches = 0u64;
        let mut offset = 0u64;

        let stop_reason = 'scan: loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }

            let chunk = match self.heap.read_chunk(offset, self.chunk_records) {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::error!(offset, error = %e, "Search heap read failed");
                    break StopReason::ReadError;
                }
            };
            if chunk.is_empty() {
                break StopReason::Exhausted;
            }

            for (i, encoded) in chunk.chunks_exact(RECORD_LEN).enumerate() {
                records_scanned += 1;
                if record::is_tombstoned(encoded) {
                    continue;
                }

                let record = match record::decode(encoded) {
                    Ok(record) => record,
                    Err(e) => {
                        let at = offset + (i * RECORD_LEN) as u64;
                        tracing::warn!(offset = at, error = %e, "Skipping undecodable record");
                        continue;
                    }
                };

                if !matches_query(&record, &self.query, self.scope) {
                    continue;
                }
                if let Err(reason) = self.send(record) {
                    break 'scan reason;
                }
                matches += 1;
            }

            offset += chunk.len() as u64;
        };

        tracing::debug!(
            records_scanned,
            matches,
            ?stop_reason,
            "Search scan finished"
        );

        ScanSummary {
            records_scanned,
            matches,
            stop_reason,
        }
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self.stop.load(Ordering::Acquire) {
            return Some(StopReason::Canceled);
        }
        match self.ctx.check() {
            Err(StoreError::DeadlineExceeded) => return Some(StopReason::DeadlineExceeded),
            Err(_) => return Some(StopReason::Canceled),
            Ok(()) => {}
        }
        (Instant::now() >= self.deadline).then_some(StopReason::DeadlineExceeded)
    }

    /// Push one result, re-checking for cancellation while the channel is full
    fn send(&self, mut record: UserRecord) -> std::result::Result<(), StopReason> {
        loop {
            match self.results.send_timeout(record, POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => {
                    if let Some(reason) = self.stop_reason() {
                        return Err(reason);
                    }
                    record = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => return Err(StopReason::ConsumerGone),
            }
        }
    }
}

/// Whether `record` contains `query` in the fields selected by `scope`
///
/// An empty query matches every record.
pub(crate) fn matches_query(record: &UserRecord, query: &[u8], scope: SearchScope) -> bool {
    contains(&record.name, query)
        || (scope == SearchScope::NameOrData && contains(&record.data, query))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
