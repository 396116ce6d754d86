//! In-memory index
//!
//! Hash map for liveness plus an offset-ordered entry list.

use std::collections::HashMap;

use uuid::Uuid;

use super::IndexEntry;

/// The in-memory index
///
/// - `live`: id → heap offset. Presence means live; absence means not found
///   or deleted.
/// - `by_offset`: entries sorted by ascending offset, kept sorted with binary
///   search on every insert/update/remove.
#[derive(Debug, Default)]
pub struct MemIndex {
    live: HashMap<Uuid, u64>,
    by_offset: Vec<IndexEntry>,
}

impl MemIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one logged mutation, as replay does
    ///
    /// Later entries for the same offset or id supersede earlier ones.
    pub fn apply(&mut self, entry: &IndexEntry) {
        if entry.tombstone {
            self.live.remove(&entry.id);
            self.remove_at_offset(entry.offset, &entry.id);
        } else {
            self.insert_live(entry.id, entry.offset);
        }
    }

    /// Record `id` as live at `offset`
    ///
    /// An existing entry at the same offset is overwritten in place.
    pub fn insert_live(&mut self, id: Uuid, offset: u64) {
        if let Some(previous) = self.live.insert(id, offset) {
            if previous != offset {
                self.remove_at_offset(previous, &id);
            }
        }

        let entry = IndexEntry::live(id, offset);
        match self.by_offset.binary_search_by_key(&offset, |e| e.offset) {
            Ok(pos) => self.by_offset[pos] = entry,
            Err(pos) => self.by_offset.insert(pos, entry),
        }
    }

    /// Drop `id` from the live set; returns the offset it occupied
    pub fn remove(&mut self, id: &Uuid) -> Option<u64> {
        let offset = self.live.remove(id)?;
        self.remove_at_offset(offset, id);
        Some(offset)
    }

    /// Heap offset of a live id
    pub fn get(&self, id: &Uuid) -> Option<u64> {
        self.live.get(id).copied()
    }

    /// Whether `id` is live
    pub fn contains(&self, id: &Uuid) -> bool {
        self.live.contains_key(id)
    }

    /// Number of live ids
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whether no id is live
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Iterate over live ids (unordered)
    pub fn live_ids(&self) -> impl Iterator<Item = &Uuid> {
        self.live.keys()
    }

    /// Entries ordered by ascending offset
    pub fn entries(&self) -> &[IndexEntry] {
        &self.by_offset
    }

    /// The entry whose record span contains byte `position` of the heap
    ///
    /// `record_len` is the fixed record width.
    pub fn entry_containing(&self, position: u64, record_len: u64) -> Option<&IndexEntry> {
        let idx = self.by_offset.partition_point(|e| e.offset <= position);
        let entry = self.by_offset.get(idx.checked_sub(1)?)?;
        (position < entry.offset + record_len).then_some(entry)
    }

    fn remove_at_offset(&mut self, offset: u64, id: &Uuid) {
        if let Ok(pos) = self.by_offset.binary_search_by_key(&offset, |e| e.offset) {
            if self.by_offset[pos].id == *id {
                self.by_offset.remove(pos);
            }
        }
    }
}
