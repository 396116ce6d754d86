//! Index log entry definitions
//!
//! Defines the structure of individual index log entries.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::record::ID_LEN;

/// Bytes covered by the checksum: Id (16) + Offset (8) + Tombstone (1)
const PAYLOAD_SIZE: usize = ID_LEN + 8 + 1;

/// Total entry size: payload + CRC32 (4)
pub const ENTRY_SIZE: usize = PAYLOAD_SIZE + 4;

/// One index mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Record identifier
    pub id: Uuid,

    /// Byte offset of the record in the data heap
    pub offset: u64,

    /// True when this entry deletes the record
    pub tombstone: bool,
}

impl IndexEntry {
    /// Entry for a newly created record
    pub fn live(id: Uuid, offset: u64) -> Self {
        Self {
            id,
            offset,
            tombstone: false,
        }
    }

    /// Entry deleting the record at `offset`
    pub fn tombstone(id: Uuid, offset: u64) -> Self {
        Self {
            id,
            offset,
            tombstone: true,
        }
    }

    /// Serialize to the fixed-width on-disk form
    pub fn serialize(&self) -> [u8; ENTRY_SIZE] {
        let mut out = [0u8; ENTRY_SIZE];
        {
            let mut buf = &mut out[..PAYLOAD_SIZE];
            buf.put_slice(self.id.as_bytes());
            buf.put_u64_le(self.offset);
            buf.put_u8(self.tombstone as u8);
        }
        let crc = crc32fast::hash(&out[..PAYLOAD_SIZE]);
        out[PAYLOAD_SIZE..].copy_from_slice(&crc.to_le_bytes());
        out
    }

    /// Deserialize from the fixed-width on-disk form, verifying the checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENTRY_SIZE {
            return Err(StoreError::IndexLog(format!(
                "entry needs {} bytes, got {}",
                ENTRY_SIZE,
                bytes.len()
            )));
        }

        let payload = &bytes[..PAYLOAD_SIZE];
        let mut crc_bytes = &bytes[PAYLOAD_SIZE..ENTRY_SIZE];
        let stored_crc = crc_bytes.get_u32_le();
        let computed_crc = crc32fast::hash(payload);
        if stored_crc != computed_crc {
            return Err(StoreError::IndexLog(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored_crc, computed_crc
            )));
        }

        let mut buf = payload;
        let mut id = [0u8; ID_LEN];
        buf.copy_to_slice(&mut id);
        let offset = buf.get_u64_le();
        let tombstone = match buf.get_u8() {
            0 => false,
            1 => true,
            other => {
                return Err(StoreError::IndexLog(format!(
                    "invalid tombstone flag {}",
                    other
                )))
            }
        };

        Ok(Self {
            id: Uuid::from_bytes(id),
            offset,
            tombstone,
        })
    }
}
