//! Record Module
//!
//! The user record and its fixed-width on-disk encoding.
//!
//! ## Encoded Layout (1279 bytes, little-endian)
//! ```text
//! ┌──────────┬──────────────┬─────────┬────────────┬──────────┬─────────────┬───────────┐
//! │ Id (16)  │DeletedAt (8) │NameLen  │ Name (250) │DataLen(2)│ Data (1000) │ Perms (2) │
//! │          │ 0 = live     │  (1)    │ zero-pad   │          │ zero-pad    │           │
//! └──────────┴──────────────┴─────────┴────────────┴──────────┴─────────────┴───────────┘
//! ```
//!
//! Every record on the heap occupies exactly `RECORD_LEN` bytes, so record N
//! starts at `N * RECORD_LEN`.

mod codec;
mod user;

pub use codec::{decode, encode, is_tombstoned};
pub use user::UserRecord;

// =============================================================================
// Layout Constants
// =============================================================================

/// Identifier width
pub const ID_LEN: usize = 16;

/// Maximum name length in bytes
pub const MAX_NAME_LEN: usize = 250;

/// Maximum data payload length in bytes
pub const MAX_DATA_LEN: usize = 1000;

/// Byte offset of the deleted-at field within an encoded record
pub const DELETED_AT_OFFSET: u64 = ID_LEN as u64;

pub(crate) const NAME_LEN_OFFSET: usize = ID_LEN + 8;
pub(crate) const NAME_OFFSET: usize = NAME_LEN_OFFSET + 1;
pub(crate) const DATA_LEN_OFFSET: usize = NAME_OFFSET + MAX_NAME_LEN;
pub(crate) const DATA_OFFSET: usize = DATA_LEN_OFFSET + 2;

/// Total encoded record width: 16 + 8 + 1 + 250 + 2 + 1000 + 2
pub const RECORD_LEN: usize = DATA_OFFSET + MAX_DATA_LEN + 2;
