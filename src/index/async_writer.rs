//! Async index writer
//!
//! A background thread draining a bounded queue of index entries into the
//! index log. The store enqueues and returns without waiting for the write;
//! a full queue blocks the enqueuing caller (back-pressure).
//!
//! Failed appends are not retried. They are logged and published on an
//! unbounded health channel so the owner can detect the durability gap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::{Result, StoreError};

use super::{IndexEntry, IndexLogWriter};

/// Destination of the writer thread's entries
pub trait IndexSink: Send + 'static {
    /// Durably append one entry
    fn append(&mut self, entry: &IndexEntry) -> Result<()>;

    /// Final sync when the writer stops
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

impl IndexSink for IndexLogWriter {
    fn append(&mut self, entry: &IndexEntry) -> Result<()> {
        IndexLogWriter::append(self, entry)
    }

    fn sync(&mut self) -> Result<()> {
        IndexLogWriter::sync(self)
    }
}

/// An entry the writer thread failed to persist
#[derive(Debug, Clone)]
pub struct IndexWriteFailure {
    pub entry: IndexEntry,
    pub error: String,
}

/// Shared counters between the handle and the thread
#[derive(Default)]
struct WriterStats {
    persisted: AtomicU64,
    failed: AtomicU64,
}

/// Handle to the background index writer
pub struct AsyncIndexWriter {
    /// Queue into the writer thread; `None` once shut down
    sender: Option<Sender<IndexEntry>>,
    /// Writer thread
    handle: Option<JoinHandle<()>>,
    /// Health channel of failed appends
    failures: Receiver<IndexWriteFailure>,
    stats: Arc<WriterStats>,
}

impl AsyncIndexWriter {
    /// Start the writer thread with a queue bounded at `capacity`
    pub fn spawn<S: IndexSink>(sink: S, capacity: usize) -> Result<Self> {
        let (sender, receiver) = channel::bounded::<IndexEntry>(capacity);
        let (failure_tx, failures) = channel::unbounded();
        let stats = Arc::new(WriterStats::default());

        let thread_stats = Arc::clone(&stats);
        let handle = thread::Builder::new()
            .name("userstore-index-writer".to_string())
            .spawn(move || Self::run(sink, receiver, failure_tx, thread_stats))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            failures,
            stats,
        })
    }

    /// Enqueue an entry; blocks while the queue is full
    pub fn submit(&self, entry: IndexEntry) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| StoreError::IndexLog("index writer is shut down".to_string()))?;

        sender
            .send(entry)
            .map_err(|_| StoreError::IndexLog("index writer thread has exited".to_string()))
    }

    /// Entries queued but not yet taken by the writer thread
    pub fn pending(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }

    /// Entries successfully appended to the log
    pub fn persisted_count(&self) -> u64 {
        self.stats.persisted.load(Ordering::Acquire)
    }

    /// Appends that failed over the writer's lifetime
    pub fn failure_count(&self) -> u64 {
        self.stats.failed.load(Ordering::Acquire)
    }

    /// Take every failure reported so far
    pub fn drain_failures(&self) -> Vec<IndexWriteFailure> {
        self.failures.try_iter().collect()
    }

    /// Close the queue, let the thread drain it, and join
    pub fn shutdown(&mut self) -> Result<()> {
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| StoreError::IndexLog("index writer thread panicked".to_string()))?;
        }
        Ok(())
    }

    fn run<S: IndexSink>(
        mut sink: S,
        receiver: Receiver<IndexEntry>,
        failure_tx: Sender<IndexWriteFailure>,
        stats: Arc<WriterStats>,
    ) {
        tracing::debug!("Index writer started");

        for entry in receiver.iter() {
            match sink.append(&entry) {
                Ok(()) => {
                    stats.persisted.fetch_add(1, Ordering::AcqRel);
                }
                Err(e) => {
                    tracing::error!(
                        id = %entry.id,
                        offset = entry.offset,
                        tombstone = entry.tombstone,
                        error = %e,
                        "Index log append failed"
                    );
                    let _ = failure_tx.send(IndexWriteFailure {
                        entry,
                        error: e.to_string(),
                    });
                    stats.failed.fetch_add(1, Ordering::AcqRel);
                }
            }
        }

        if let Err(e) = sink.sync() {
            tracing::error!(error = %e, "Index log final sync failed");
        }
        tracing::debug!("Index writer stopped");
    }
}

impl Drop for AsyncIndexWriter {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!(error = %e, "Index writer shutdown failed");
        }
    }
}
