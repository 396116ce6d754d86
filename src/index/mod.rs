//! Index Module
//!
//! The in-memory id → offset index and its write-ahead log (`pk.dat`).
//!
//! ## Responsibilities
//! - Fixed-width, checksummed index log entries
//! - Append-only index log, written by a single background thread
//! - Replay of the log into the in-memory index on open
//! - Surfacing failed log appends on a health channel
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ Entry 1 (29 bytes)                                  │
//! │ ┌──────────┬────────────┬────────────┬───────────┐  │
//! │ │ Id (16)  │ Offset (8) │ Tomb (1)   │ CRC (4)   │  │
//! │ └──────────┴────────────┴────────────┴───────────┘  │
//! ├─────────────────────────────────────────────────────┤
//! │ Entry 2 ...                                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//! No header. A torn or corrupt entry ends replay; everything before it is kept.

mod async_writer;
mod entry;
mod memory;
mod reader;
mod recovery;
mod writer;

pub use async_writer::{AsyncIndexWriter, IndexSink, IndexWriteFailure};
pub use entry::{IndexEntry, ENTRY_SIZE};
pub use memory::MemIndex;
pub use reader::{IndexLogIter, IndexLogReader};
pub use recovery::{IndexRecovery, RecoveryResult};
pub use writer::IndexLogWriter;
