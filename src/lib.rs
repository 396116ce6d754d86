//! # userstore
//!
//! An embedded, single-writer user record store with:
//! - A fixed-width, append-only data heap with in-place tombstones
//! - An index log persisted asynchronously by a background writer
//! - Crash recovery by full index log replay
//! - Scan-based substring search with cancellation and deadlines
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Callers                               │
//! │        create / read / delete / search  (+ Context)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Store Façade                             │
//! │             (one critical section: Mutex)                    │
//! └──────┬──────────────────────┬──────────────────┬────────────┘
//!        │                      │                  │ spawn
//!        ▼                      ▼                  ▼
//!  ┌───────────┐        ┌─────────────┐     ┌─────────────┐
//!  │ Data Heap │        │  MemIndex   │     │   Scanner   │
//!  │ fdata.dat │◄───────┤ id → offset │     │  (thread)   │──► SearchStream
//!  └───────────┘  pread └──────┬──────┘     └──────┬──────┘
//!        ▲                     │ bounded queue      │ pread
//!        │                     ▼                    │
//!        │             ┌──────────────┐             │
//!        │             │ Index Writer │             │
//!        │             │   (thread)   │             │
//!        │             └──────┬───────┘             │
//!        │                    ▼                     │
//!        │              ┌──────────┐                │
//!        │              │  pk.dat  │                │
//!        │              └──────────┘                │
//!        └──────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod heap;
pub mod index;
pub mod record;
pub mod search;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, IdAssignment, SearchScope};
pub use error::{Result, StoreError};
pub use record::UserRecord;
pub use search::SearchStream;
pub use store::{Context, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of userstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
