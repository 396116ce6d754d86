//! Tests for the Index Log writer and reader
//!
//! These tests verify:
//! - Appends are fixed-width and in order
//! - Reader returns entries in log order and stops cleanly at EOF
//! - Partial and corrupt entries end reading without losing earlier ones
//! - Reopening for append continues after existing entries

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use userstore::index::{IndexEntry, IndexLogReader, IndexLogWriter, ENTRY_SIZE};
use userstore::StoreError;
use tempfile::TempDir;
use uuid::Uuid;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("pk.dat");
    (temp_dir, log_path)
}

fn write_entries(path: &PathBuf, entries: &[IndexEntry]) {
    let mut writer = IndexLogWriter::open(path).unwrap();
    for entry in entries {
        writer.append(entry).unwrap();
    }
}

fn sample_entries(count: u64) -> Vec<IndexEntry> {
    (0..count)
        .map(|i| IndexEntry::live(Uuid::new_v4(), i * 1279))
        .collect()
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_writer_appends_fixed_width() {
    let (_temp, path) = setup_temp_log();
    let mut writer = IndexLogWriter::open(&path).unwrap();

    for entry in sample_entries(3) {
        writer.append(&entry).unwrap();
    }

    assert_eq!(writer.entries_written(), 3);
    assert_eq!(
        std::fs::metadata(&path).unwrap().len(),
        3 * ENTRY_SIZE as u64
    );
}

#[test]
fn test_writer_reopen_appends() {
    let (_temp, path) = setup_temp_log();
    let first = sample_entries(2);
    let second = sample_entries(2);

    write_entries(&path, &first);
    write_entries(&path, &second);

    let read: Vec<IndexEntry> = IndexLogReader::open(&path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    let expected: Vec<IndexEntry> = first.into_iter().chain(second).collect();
    assert_eq!(read, expected);
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_reader_empty_file() {
    let (_temp, path) = setup_temp_log();
    File::create(&path).unwrap();

    let mut reader = IndexLogReader::open(&path).unwrap();
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_reader_preserves_order() {
    let (_temp, path) = setup_temp_log();
    let id = Uuid::new_v4();
    let entries = vec![
        IndexEntry::live(id, 0),
        IndexEntry::tombstone(id, 0),
        IndexEntry::live(Uuid::new_v4(), 1279),
    ];
    write_entries(&path, &entries);

    let mut reader = IndexLogReader::open(&path).unwrap();
    for expected in &entries {
        assert_eq!(reader.next_entry().unwrap().as_ref(), Some(expected));
    }
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), 3 * ENTRY_SIZE as u64);
}

#[test]
fn test_reader_partial_tail() {
    let (_temp, path) = setup_temp_log();
    let entries = sample_entries(2);
    write_entries(&path, &entries);

    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&entries[0].serialize()[..10]).unwrap();
    }

    let mut reader = IndexLogReader::open(&path).unwrap();
    assert!(reader.next_entry().unwrap().is_some());
    assert!(reader.next_entry().unwrap().is_some());
    assert!(matches!(reader.next_entry(), Err(StoreError::IndexLog(_))));
    assert_eq!(reader.position(), 2 * ENTRY_SIZE as u64);
}

#[test]
fn test_iterator_stops_after_error() {
    let (_temp, path) = setup_temp_log();
    let entries = sample_entries(3);

    {
        let mut file = File::create(&path).unwrap();
        file.write_all(&entries[0].serialize()).unwrap();
        let mut bad = entries[1].serialize();
        bad[0] ^= 0xFF;
        file.write_all(&bad).unwrap();
        file.write_all(&entries[2].serialize()).unwrap();
    }

    let results: Vec<_> = IndexLogReader::open(&path).unwrap().entries().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), &entries[0]);
    assert!(results[1].is_err());
}
