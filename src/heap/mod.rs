//! Data Heap Module
//!
//! Append-only file of fixed-width encoded records (`fdata.dat`).
//!
//! ## Responsibilities
//! - Append encoded records at the end of the file
//! - Tombstone records in place by overwriting their deleted-at field
//! - Positioned reads of single records and whole-record chunks
//!
//! ## Concurrency
//! All I/O is offset-explicit (pread/pwrite), so the scanner can read while
//! the store appends without sharing a file cursor. Appends and tombstones are
//! serialized by the store's critical section. No write returns before the
//! bytes are synced to disk.
//!
//! The heap never shrinks: tombstoned records keep their space (no compaction).

mod file;

pub use file::DataHeap;
