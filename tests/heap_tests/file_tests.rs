//! Tests for the Data Heap
//!
//! These tests verify:
//! - Appends land at multiples of the record width
//! - In-place tombstones touch only the deleted-at field
//! - Positioned reads of single records and chunks
//! - Reopen keeps contents and trims a torn tail

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use userstore::heap::DataHeap;
use userstore::record::{decode, encode, UserRecord, RECORD_LEN};
use userstore::StoreError;
use tempfile::TempDir;
use uuid::Uuid;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_heap() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let heap_path = temp_dir.path().join("fdata.dat");
    (temp_dir, heap_path)
}

fn encoded(name: &str) -> Vec<u8> {
    encode(&UserRecord::new(Uuid::new_v4(), name, "payload", 3))
        .unwrap()
        .to_vec()
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_open_creates_empty_heap() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();

    assert!(path.exists());
    assert!(heap.is_empty());
    assert_eq!(heap.record_count(), 0);
}

#[test]
fn test_append_offsets_are_record_multiples() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();

    for i in 0..5u64 {
        let offset = heap.append(&encoded(&format!("user{}", i))).unwrap();
        assert_eq!(offset, i * RECORD_LEN as u64);
    }

    assert_eq!(heap.len(), 5 * RECORD_LEN as u64);
    assert_eq!(heap.record_count(), 5);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), heap.len());
}

#[test]
fn test_append_rejects_wrong_width() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();

    let result = heap.append(&[0u8; 10]);
    assert!(matches!(result, Err(StoreError::CorruptRecord(_))));
    assert!(heap.is_empty());
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_at_returns_appended_record() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();

    let first = UserRecord::new(Uuid::new_v4(), "first", "a", 1);
    let second = UserRecord::new(Uuid::new_v4(), "second", "b", 2);
    let off1 = heap.append(&encode(&first).unwrap()).unwrap();
    let off2 = heap.append(&encode(&second).unwrap()).unwrap();

    assert_eq!(decode(&heap.read_at(off1).unwrap()).unwrap(), first);
    assert_eq!(decode(&heap.read_at(off2).unwrap()).unwrap(), second);
}

#[test]
fn test_read_at_rejects_unaligned_or_out_of_range() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();
    heap.append(&encoded("only")).unwrap();

    assert!(matches!(heap.read_at(1), Err(StoreError::CorruptRecord(_))));
    assert!(matches!(
        heap.read_at(RECORD_LEN as u64),
        Err(StoreError::CorruptRecord(_))
    ));
}

#[test]
fn test_huge_offsets_are_rejected_not_overflowed() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();
    heap.append(&encoded("only")).unwrap();

    let last_boundary = u64::MAX - u64::MAX % RECORD_LEN as u64;
    assert!(matches!(
        heap.read_at(last_boundary),
        Err(StoreError::CorruptRecord(_))
    ));
    assert!(matches!(
        heap.mark_deleted(last_boundary, NonZeroU64::new(1).unwrap()),
        Err(StoreError::CorruptRecord(_))
    ));
    assert!(heap.read_chunk(last_boundary, 4).unwrap().is_empty());
}

#[test]
fn test_read_chunk_bounds() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();
    for i in 0..7 {
        heap.append(&encoded(&format!("u{}", i))).unwrap();
    }

    let first = heap.read_chunk(0, 3).unwrap();
    assert_eq!(first.len(), 3 * RECORD_LEN);

    let tail = heap.read_chunk(6 * RECORD_LEN as u64, 3).unwrap();
    assert_eq!(tail.len(), RECORD_LEN);

    let past_end = heap.read_chunk(heap.len(), 3).unwrap();
    assert!(past_end.is_empty());
}

// =============================================================================
// Tombstone Tests
// =============================================================================

#[test]
fn test_mark_deleted_only_touches_deleted_at() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();

    let record = UserRecord::new(Uuid::new_v4(), "carol", "data", 9);
    let offset = heap.append(&encode(&record).unwrap()).unwrap();
    let before = heap.read_at(offset).unwrap();

    let ts = NonZeroU64::new(1_234_567).unwrap();
    heap.mark_deleted(offset, ts).unwrap();
    let after = heap.read_at(offset).unwrap();

    assert_eq!(&after[..16], &before[..16]);
    assert_eq!(&after[16..24], &1_234_567u64.to_le_bytes());
    assert_eq!(&after[24..], &before[24..]);

    let decoded = decode(&after).unwrap();
    assert_eq!(decoded.deleted_at, Some(ts));
    assert_eq!(decoded.name, b"carol");
    assert_eq!(heap.len(), RECORD_LEN as u64);
}

#[test]
fn test_mark_deleted_leaves_neighbours_alone() {
    let (_temp, path) = setup_temp_heap();
    let heap = DataHeap::open(&path).unwrap();

    let a = heap.append(&encoded("a")).unwrap();
    let b = heap.append(&encoded("b")).unwrap();
    let c = heap.append(&encoded("c")).unwrap();

    heap.mark_deleted(b, NonZeroU64::new(5).unwrap()).unwrap();

    assert!(decode(&heap.read_at(a).unwrap()).unwrap().is_live());
    assert!(!decode(&heap.read_at(b).unwrap()).unwrap().is_live());
    assert!(decode(&heap.read_at(c).unwrap()).unwrap().is_live());
}

#[test]
fn test_concurrent_appends_get_distinct_offsets() {
    let (_temp, path) = setup_temp_heap();
    let heap = Arc::new(DataHeap::open(&path).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let heap = Arc::clone(&heap);
            thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        let name = format!("t{}-{}", t, i);
                        (heap.append(&encoded(&name)).unwrap(), name)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let appended: Vec<(u64, String)> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let offsets: HashSet<u64> = appended.iter().map(|(off, _)| *off).collect();
    assert_eq!(offsets.len(), 100);
    assert_eq!(heap.record_count(), 100);

    for (offset, name) in &appended {
        let record = decode(&heap.read_at(*offset).unwrap()).unwrap();
        assert_eq!(record.name, name.as_bytes());
    }
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_preserves_records() {
    let (_temp, path) = setup_temp_heap();
    let record = UserRecord::new(Uuid::new_v4(), "persist", "me", 4);

    {
        let heap = DataHeap::open(&path).unwrap();
        heap.append(&encoded("first")).unwrap();
        heap.append(&encode(&record).unwrap()).unwrap();
    }

    let heap = DataHeap::open(&path).unwrap();
    assert_eq!(heap.record_count(), 2);
    assert_eq!(
        decode(&heap.read_at(RECORD_LEN as u64).unwrap()).unwrap(),
        record
    );

    // Appends continue after the existing records
    let offset = heap.append(&encoded("third")).unwrap();
    assert_eq!(offset, 2 * RECORD_LEN as u64);
}

#[test]
fn test_reopen_trims_partial_record() {
    let (_temp, path) = setup_temp_heap();

    {
        let heap = DataHeap::open(&path).unwrap();
        heap.append(&encoded("whole")).unwrap();
    }
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0xAB; 100]).unwrap();
        file.sync_all().unwrap();
    }

    let heap = DataHeap::open(&path).unwrap();
    assert_eq!(heap.len(), RECORD_LEN as u64);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), RECORD_LEN as u64);

    let offset = heap.append(&encoded("next")).unwrap();
    assert_eq!(offset, RECORD_LEN as u64);
}
