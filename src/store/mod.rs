//! Store Module
//!
//! The repository façade that coordinates the heap, the index and the
//! background index writer.
//!
//! ## Responsibilities
//! - Create/Read/Delete/Search behind one critical section
//! - Validate bounds and duplicates before any file is touched
//! - Hand index mutations to the async writer without waiting on log I/O
//! - Replay the index log before the first operation is accepted

mod context;

pub use context::Context;

use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::{Config, IdAssignment};
use crate::error::{Result, StoreError};
use crate::heap::DataHeap;
use crate::index::{
    AsyncIndexWriter, IndexEntry, IndexLogWriter, IndexRecovery, IndexWriteFailure, MemIndex,
    RecoveryResult,
};
use crate::record::{self, UserRecord};
use crate::search::{Scanner, SearchStream};

/// The embedded user record store
///
/// ## Concurrency Model: one critical section
///
/// - `index` doubles as the store's single lock. Create, Read, Delete and
///   the start of Search all run while holding it, so they are linearized
///   and readers are serialized against writers.
/// - Heap I/O is positioned, so a search thread reads the heap without the
///   lock while later operations append or tombstone.
/// - Index log writes happen on the writer thread. An accepted Create/Delete
///   is in memory and on the heap, but its log entry may still be queued.
pub struct Store {
    /// Store configuration
    config: Config,

    /// Data heap (`fdata.dat`), shared with search threads
    heap: Arc<DataHeap>,

    /// In-memory index; its mutex is the critical section
    index: Mutex<MemIndex>,

    /// Background writer for `pk.dat`
    index_writer: AsyncIndexWriter,

    /// What replay found on open
    recovery: RecoveryResult,
}

impl Store {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DATA_FILENAME: &'static str = "fdata.dat";
    const INDEX_FILENAME: &'static str = "pk.dat";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if needed
    /// 2. Replay the index log into the in-memory index
    /// 3. Open the data heap
    /// 4. Start the index writer thread
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let index_path = config.data_dir.join(Self::INDEX_FILENAME);
        let (index, recovery) = IndexRecovery::recover(&index_path)?;

        let heap = DataHeap::open(&config.data_dir.join(Self::DATA_FILENAME))?;

        if let Some(stray) = index.entries().iter().find(|e| e.offset >= heap.len()) {
            return Err(StoreError::IndexLog(format!(
                "index entry for {} points at offset {} past the heap end {}",
                stray.id,
                stray.offset,
                heap.len()
            )));
        }

        let log = IndexLogWriter::open(&index_path)?;
        let index_writer = AsyncIndexWriter::spawn(log, config.index_queue_capacity)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            live = index.live_count(),
            heap_records = heap.record_count(),
            "Store opened"
        );

        Ok(Self {
            config,
            heap: Arc::new(heap),
            index: Mutex::new(index),
            index_writer,
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Store a new record; returns its identifier
    ///
    /// Fails with `DuplicateId` if the id is live and `RecordTooLarge` if a
    /// bound is exceeded. Both checks happen before any write. Blocks while
    /// the index writer queue is full.
    pub fn create(&self, ctx: &Context, mut record: UserRecord) -> Result<Uuid> {
        ctx.check()?;
        let mut index = self.index.lock();
        ctx.check()?;

        if self.config.id_assignment == IdAssignment::Generate {
            record.id = loop {
                let id = Uuid::new_v4();
                if !index.contains(&id) {
                    break id;
                }
            };
        }
        record.deleted_at = None;

        if index.contains(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }

        let encoded = record::encode(&record)?;
        let offset = self.heap.append(&encoded)?;
        index.insert_live(record.id, offset);
        self.index_writer.submit(IndexEntry::live(record.id, offset))?;

        tracing::debug!(id = %record.id, offset, "Record created");
        Ok(record.id)
    }

    /// Fetch a live record by id
    pub fn read(&self, ctx: &Context, id: &Uuid) -> Result<UserRecord> {
        ctx.check()?;
        let index = self.index.lock();
        ctx.check()?;

        let offset = index.get(id).ok_or(StoreError::NotFound)?;
        let record = record::decode(&self.heap.read_at(offset)?)?;

        // The map should never point at a tombstone; the heap is authoritative here
        if !record.is_live() {
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    /// Delete a record by id
    ///
    /// Idempotent: deleting an absent or already deleted id succeeds.
    pub fn delete(&self, ctx: &Context, id: &Uuid) -> Result<()> {
        ctx.check()?;
        let mut index = self.index.lock();
        ctx.check()?;

        let Some(offset) = index.get(id) else {
            return Ok(());
        };

        self.heap.mark_deleted(offset, now_unix_secs())?;
        index.remove(id);
        self.index_writer.submit(IndexEntry::tombstone(*id, offset))?;

        tracing::debug!(%id, offset, "Record deleted");
        Ok(())
    }

    /// Start a substring search over live records
    ///
    /// The scan runs on its own thread and does not hold the store lock.
    pub fn search(&self, ctx: &Context, query: impl Into<Vec<u8>>) -> Result<SearchStream> {
        ctx.check()?;
        let _index = self.index.lock();
        ctx.check()?;

        Scanner::spawn(Arc::clone(&self.heap), query.into(), &self.config, ctx.clone())
    }

    /// Close the store gracefully
    ///
    /// Drains the index writer queue, joins the writer thread and syncs the heap.
    pub fn close(mut self) -> Result<()> {
        self.index_writer.shutdown()?;
        self.heap.sync()?;
        tracing::info!(data_dir = %self.config.data_dir.display(), "Store closed");
        Ok(())
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Take every index log append failure reported since the last call
    pub fn index_write_failures(&self) -> Vec<IndexWriteFailure> {
        self.index_writer.drain_failures()
    }

    /// Index log append failures over the store's lifetime
    pub fn index_failure_count(&self) -> u64 {
        self.index_writer.failure_count()
    }

    /// Index entries accepted but not yet picked up by the writer
    pub fn pending_index_writes(&self) -> usize {
        self.index_writer.pending()
    }

    /// Index entries persisted since open
    pub fn persisted_index_writes(&self) -> u64 {
        self.index_writer.persisted_count()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Data heap length in bytes
    pub fn heap_len(&self) -> u64 {
        self.heap.len()
    }

    /// Records on the heap, tombstoned ones included
    pub fn record_count(&self) -> u64 {
        self.heap.record_count()
    }

    /// Number of live records
    pub fn live_count(&self) -> usize {
        self.index.lock().live_count()
    }

    /// Live ids (unordered)
    pub fn live_ids(&self) -> Vec<Uuid> {
        self.index.lock().live_ids().copied().collect()
    }

    /// Snapshot of the offset-ordered index entries
    pub fn index_entries(&self) -> Vec<IndexEntry> {
        self.index.lock().entries().to_vec()
    }

    /// The live record whose heap span contains byte `position`, if any
    pub fn locate(&self, position: u64) -> Option<Uuid> {
        self.index
            .lock()
            .entry_containing(position, record::RECORD_LEN as u64)
            .map(|e| e.id)
    }

    /// What replay found when the store was opened
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Path of the data heap file
    pub fn data_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::DATA_FILENAME)
    }

    /// Path of the index log file
    pub fn index_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::INDEX_FILENAME)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Current unix time in seconds, never zero (zero means live on disk)
fn now_unix_secs() -> NonZeroU64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    NonZeroU64::new(secs).unwrap_or(NonZeroU64::MIN)
}
