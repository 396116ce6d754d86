//! Tests for the In-Memory Index
//!
//! These tests verify:
//! - Live map and offset-ordered list stay consistent
//! - Removal by id
//! - Offset-range lookups over the ordered list

use userstore::index::{IndexEntry, MemIndex};
use userstore::record::RECORD_LEN;
use uuid::Uuid;

const STRIDE: u64 = RECORD_LEN as u64;

#[test]
fn test_new_index_is_empty() {
    let index = MemIndex::new();
    assert!(index.is_empty());
    assert_eq!(index.live_count(), 0);
    assert!(index.entries().is_empty());
}

#[test]
fn test_insert_and_get() {
    let mut index = MemIndex::new();
    let id = Uuid::new_v4();

    index.insert_live(id, STRIDE);

    assert_eq!(index.get(&id), Some(STRIDE));
    assert!(index.contains(&id));
    assert_eq!(index.entries(), &[IndexEntry::live(id, STRIDE)]);
}

#[test]
fn test_entries_stay_sorted() {
    let mut index = MemIndex::new();
    let offsets = [5, 1, 3, 0, 4, 2];
    for off in offsets {
        index.insert_live(Uuid::new_v4(), off * STRIDE);
    }

    let got: Vec<u64> = index.entries().iter().map(|e| e.offset / STRIDE).collect();
    assert_eq!(got, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_remove_returns_offset() {
    let mut index = MemIndex::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    index.insert_live(a, 0);
    index.insert_live(b, STRIDE);

    assert_eq!(index.remove(&a), Some(0));
    assert_eq!(index.remove(&a), None);
    assert_eq!(index.live_count(), 1);
    assert_eq!(index.entries(), &[IndexEntry::live(b, STRIDE)]);
}

#[test]
fn test_apply_tombstone_for_unknown_id_is_noop() {
    let mut index = MemIndex::new();
    let a = Uuid::new_v4();
    index.insert_live(a, 0);

    index.apply(&IndexEntry::tombstone(Uuid::new_v4(), 0));

    assert!(index.contains(&a));
    assert_eq!(index.entries().len(), 1);
}

#[test]
fn test_reinsert_moves_offset() {
    let mut index = MemIndex::new();
    let id = Uuid::new_v4();
    index.insert_live(id, 0);
    index.insert_live(id, 2 * STRIDE);

    assert_eq!(index.get(&id), Some(2 * STRIDE));
    assert_eq!(index.entries(), &[IndexEntry::live(id, 2 * STRIDE)]);
}

#[test]
fn test_entry_containing() {
    let mut index = MemIndex::new();
    let a = Uuid::new_v4();
    let c = Uuid::new_v4();
    index.insert_live(a, 0);
    index.insert_live(c, 2 * STRIDE); // record 1 is deleted / absent

    assert_eq!(index.entry_containing(0, STRIDE).map(|e| e.id), Some(a));
    assert_eq!(index.entry_containing(STRIDE - 1, STRIDE).map(|e| e.id), Some(a));
    assert!(index.entry_containing(STRIDE + 10, STRIDE).is_none());
    assert_eq!(
        index.entry_containing(2 * STRIDE + 500, STRIDE).map(|e| e.id),
        Some(c)
    );
    assert!(index.entry_containing(3 * STRIDE, STRIDE).is_none());
}
