//! Error types for userstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for userstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Repository Errors
    // -------------------------------------------------------------------------
    #[error("Duplicate record id: {0}")]
    DuplicateId(Uuid),

    #[error("Record not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Record Layout Errors
    // -------------------------------------------------------------------------
    #[error("Record too large: {field} is {len} bytes, max {max}")]
    RecordTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    // -------------------------------------------------------------------------
    // Index Log Errors
    // -------------------------------------------------------------------------
    #[error("Index log error: {0}")]
    IndexLog(String),

    // -------------------------------------------------------------------------
    // Cancellation Errors
    // -------------------------------------------------------------------------
    #[error("Operation canceled")]
    Canceled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// True for both caller cancellation and an expired deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(self, StoreError::Canceled | StoreError::DeadlineExceeded)
    }
}
