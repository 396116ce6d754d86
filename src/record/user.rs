//! User record definition

use std::borrow::Cow;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

use super::{MAX_DATA_LEN, MAX_NAME_LEN};

/// A single user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Identifier, unique among live records
    pub id: Uuid,

    /// Name bytes (at most 250)
    pub name: Vec<u8>,

    /// Opaque payload (at most 1000 bytes)
    pub data: Vec<u8>,

    /// Permission bits
    pub permissions: u16,

    /// Soft-delete timestamp in unix seconds; `None` while live
    pub deleted_at: Option<NonZeroU64>,
}

impl UserRecord {
    /// Create a live record
    pub fn new(
        id: Uuid,
        name: impl Into<Vec<u8>>,
        data: impl Into<Vec<u8>>,
        permissions: u16,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            data: data.into(),
            permissions,
            deleted_at: None,
        }
    }

    /// Whether the record carries no tombstone
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Check the name and data bounds
    pub fn validate(&self) -> Result<()> {
        if self.name.len() > MAX_NAME_LEN {
            return Err(StoreError::RecordTooLarge {
                field: "name",
                len: self.name.len(),
                max: MAX_NAME_LEN,
            });
        }
        if self.data.len() > MAX_DATA_LEN {
            return Err(StoreError::RecordTooLarge {
                field: "data",
                len: self.data.len(),
                max: MAX_DATA_LEN,
            });
        }
        Ok(())
    }

    /// Name as text, replacing invalid UTF-8
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Data as text, replacing invalid UTF-8
    pub fn data_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
