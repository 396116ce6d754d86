//! Search Module
//!
//! Substring search by full heap scan.
//!
//! ## How a search runs
//! - The store spawns one scanner thread per search
//! - The scanner reads whole-record chunks with positioned reads, decodes each
//!   record at its fixed stride, skips tombstones, and matches the query
//!   against the decoded fields
//! - Matches flow through a bounded channel into a `SearchStream`
//! - The scan stops at end of heap, on caller cancellation, when the stream is
//!   dropped, after an idle timeout, or at the run deadline
//!
//! The scan is not linearized with concurrent creates/deletes: it sees
//! whatever the heap holds when each chunk is read.

mod scanner;
mod stream;

use std::time::Duration;

pub use scanner::{ScanSummary, Scanner, StopReason};
pub use stream::SearchStream;

/// Granularity at which blocked senders and receivers re-check for cancellation
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(25);
