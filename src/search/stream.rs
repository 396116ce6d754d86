//! Search result stream
//!
//! Consumer side of a search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};

use crate::record::UserRecord;
use crate::store::Context;

use super::{ScanSummary, POLL_INTERVAL};

/// Finite, cancellable sequence of search results
///
/// Ends when the scan completes, the caller's context is done, or no result
/// has arrived within the idle timeout. Dropping the stream stops the scan.
/// A stream cannot be resumed; search again to restart.
pub struct SearchStream {
    /// `None` once the stream has ended
    results: Option<Receiver<UserRecord>>,
    stop: Arc<AtomicBool>,
    ctx: Context,
    idle_timeout: Duration,
    last_activity: Instant,
    handle: Option<JoinHandle<ScanSummary>>,
}

impl SearchStream {
    pub(crate) fn new(
        results: Receiver<UserRecord>,
        stop: Arc<AtomicBool>,
        ctx: Context,
        idle_timeout: Duration,
        handle: JoinHandle<ScanSummary>,
    ) -> Self {
        Self {
            results: Some(results),
            stop,
            ctx,
            idle_timeout,
            last_activity: Instant::now(),
            handle: Some(handle),
        }
    }

    /// Whether the stream has ended
    pub fn is_finished(&self) -> bool {
        self.results.is_none()
    }

    /// Stop the scan if it is still running and wait for the scanner thread
    ///
    /// Returns `None` if the scanner thread panicked.
    pub fn close(mut self) -> Option<ScanSummary> {
        self.halt();
        self.handle.take()?.join().ok()
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.results = None;
    }
}

impl Iterator for SearchStream {
    type Item = UserRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.ctx.is_done() {
                self.halt();
                return None;
            }

            let results = self.results.as_ref()?;
            match results.recv_timeout(POLL_INTERVAL) {
                Ok(record) => {
                    self.last_activity = Instant::now();
                    return Some(record);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.last_activity.elapsed() >= self.idle_timeout {
                        tracing::debug!(
                            idle_ms = self.idle_timeout.as_millis() as u64,
                            "Search idle timeout"
                        );
                        self.halt();
                        return None;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.results = None;
                    return None;
                }
            }
        }
    }
}

impl Drop for SearchStream {
    fn drop(&mut self) {
        self.halt();
    }
}
