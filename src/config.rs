//! Configuration for userstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StoreError};

/// Main configuration for a userstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the store's files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── fdata.dat        (data heap, fixed-width records)
    ///     └── pk.dat           (index log)
    pub data_dir: PathBuf,

    /// Who assigns record identifiers on create
    pub id_assignment: IdAssignment,

    // -------------------------------------------------------------------------
    // Index Writer Configuration
    // -------------------------------------------------------------------------
    /// Bound of the queue between the store and the index writer thread.
    /// Create/Delete block while it is full.
    pub index_queue_capacity: usize,

    // -------------------------------------------------------------------------
    // Search Configuration
    // -------------------------------------------------------------------------
    /// Records read per scanner chunk
    pub search_chunk_records: usize,

    /// Bound of the per-search result channel
    pub search_result_capacity: usize,

    /// A search ends once no result has arrived for this long
    pub search_idle_timeout: Duration,

    /// A search never runs longer than this
    pub search_run_deadline: Duration,

    /// Which record fields a search query is matched against
    pub search_scope: SearchScope,
}

/// Identifier assignment policy for `Store::create`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdAssignment {
    /// The caller's identifier is stored as given
    CallerSupplied,

    /// The store replaces the identifier with a fresh random (v4) one
    Generate,
}

/// Record fields tested by the substring scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Match against the name only
    Name,

    /// Match against the name or the data payload
    NameOrData,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./userstore_data"),
            id_assignment: IdAssignment::CallerSupplied,
            index_queue_capacity: 100,
            search_chunk_records: 100,
            search_result_capacity: 100,
            search_idle_timeout: Duration::from_secs(2),
            search_run_deadline: Duration::from_secs(30),
            search_scope: SearchScope::NameOrData,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the store cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.index_queue_capacity == 0 {
            return Err(StoreError::Config(
                "index_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.search_chunk_records == 0 {
            return Err(StoreError::Config(
                "search_chunk_records must be at least 1".to_string(),
            ));
        }
        if self.search_result_capacity == 0 {
            return Err(StoreError::Config(
                "search_result_capacity must be at least 1".to_string(),
            ));
        }
        if self.search_idle_timeout.is_zero() || self.search_run_deadline.is_zero() {
            return Err(StoreError::Config(
                "search timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the identifier assignment policy
    pub fn id_assignment(mut self, policy: IdAssignment) -> Self {
        self.config.id_assignment = policy;
        self
    }

    /// Set the index writer queue bound
    pub fn index_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.index_queue_capacity = capacity;
        self
    }

    /// Set how many records the scanner reads per chunk
    pub fn search_chunk_records(mut self, count: usize) -> Self {
        self.config.search_chunk_records = count;
        self
    }

    /// Set the search result channel bound
    pub fn search_result_capacity(mut self, capacity: usize) -> Self {
        self.config.search_result_capacity = capacity;
        self
    }

    /// Set the search idle timeout
    pub fn search_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.search_idle_timeout = timeout;
        self
    }

    /// Set the hard per-search deadline
    pub fn search_run_deadline(mut self, deadline: Duration) -> Self {
        self.config.search_run_deadline = deadline;
        self
    }

    /// Set which fields a search matches against
    pub fn search_scope(mut self, scope: SearchScope) -> Self {
        self.config.search_scope = scope;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
