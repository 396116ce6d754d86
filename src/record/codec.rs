//! Record codec
//!
//! Byte-exact encoding and decoding of the fixed-width record layout.

use std::num::NonZeroU64;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::error::{Result, StoreError};

use super::{UserRecord, DELETED_AT_OFFSET, ID_LEN, MAX_DATA_LEN, MAX_NAME_LEN, RECORD_LEN};

/// Encode a record into exactly `RECORD_LEN` bytes
///
/// Fails with `RecordTooLarge` if the name or data exceed their bounds.
pub fn encode(record: &UserRecord) -> Result<Bytes> {
    record.validate()?;

    let mut buf = BytesMut::with_capacity(RECORD_LEN);

    buf.put_slice(record.id.as_bytes());
    buf.put_u64_le(record.deleted_at.map_or(0, NonZeroU64::get));

    buf.put_u8(record.name.len() as u8);
    buf.put_slice(&record.name);
    buf.put_bytes(0, MAX_NAME_LEN - record.name.len());

    buf.put_u16_le(record.data.len() as u16);
    buf.put_slice(&record.data);
    buf.put_bytes(0, MAX_DATA_LEN - record.data.len());

    buf.put_u16_le(record.permissions);

    debug_assert_eq!(buf.len(), RECORD_LEN);
    Ok(buf.freeze())
}

/// Decode one record from the first `RECORD_LEN` bytes of `bytes`
///
/// Fails with `CorruptRecord` on a short buffer or out-of-range length fields.
pub fn decode(bytes: &[u8]) -> Result<UserRecord> {
    if bytes.len() < RECORD_LEN {
        return Err(StoreError::CorruptRecord(format!(
            "expected {} bytes, got {}",
            RECORD_LEN,
            bytes.len()
        )));
    }

    let mut buf = &bytes[..RECORD_LEN];

    let mut id = [0u8; ID_LEN];
    buf.copy_to_slice(&mut id);

    let deleted_at = NonZeroU64::new(buf.get_u64_le());

    let name_len = buf.get_u8() as usize;
    if name_len > MAX_NAME_LEN {
        return Err(StoreError::CorruptRecord(format!(
            "name length {} exceeds {}",
            name_len, MAX_NAME_LEN
        )));
    }
    let name = buf[..name_len].to_vec();
    buf.advance(MAX_NAME_LEN);

    let data_len = buf.get_u16_le() as usize;
    if data_len > MAX_DATA_LEN {
        return Err(StoreError::CorruptRecord(format!(
            "data length {} exceeds {}",
            data_len, MAX_DATA_LEN
        )));
    }
    let data = buf[..data_len].to_vec();
    buf.advance(MAX_DATA_LEN);

    let permissions = buf.get_u16_le();

    Ok(UserRecord {
        id: Uuid::from_bytes(id),
        name,
        data,
        permissions,
        deleted_at,
    })
}

/// Check the deleted-at field of an encoded record without decoding the rest
pub fn is_tombstoned(bytes: &[u8]) -> bool {
    let start = DELETED_AT_OFFSET as usize;
    bytes
        .get(start..start + 8)
        .map_or(false, |field| field.iter().any(|&b| b != 0))
}
