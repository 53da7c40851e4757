//! Sorted index: (key, record_id) pairs ordered by key for boundary queries.

use crate::types::{Key, RecordId};

/// Sorted list of (key, record_id) pairs. Equal keys keep record order.
pub struct SortedIndex {
    /// Sorted by key ascending, then by record id.
    entries: Vec<(Key, RecordId)>,
}

impl SortedIndex {
    /// Create a new, empty index.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Rebuild the entire index from the keys of records `0..n`, in record order.
    pub fn rebuild(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.entries.clear();
        self.entries
            .extend(keys.into_iter().enumerate().map(|(i, k)| (k, i as RecordId)));
        // Stable: ties stay in record order.
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
    }

    /// Positions `[lo, hi)` of all keys in the half-open key range `[start, end)`.
    pub fn range(&self, start: &Key, end: &Key) -> (usize, usize) {
        let lo = self.entries.partition_point(|(k, _)| k < start);
        let hi = self.entries.partition_point(|(k, _)| k < end);
        (lo, hi.max(lo))
    }

    /// Positions `[lo, hi)` of all keys equal to `key`.
    pub fn equal_range(&self, key: &Key) -> (usize, usize) {
        let lo = self.entries.partition_point(|(k, _)| k < key);
        let hi = self.entries.partition_point(|(k, _)| k <= key);
        (lo, hi)
    }

    /// Record ids at positions `[lo, hi)`.
    pub fn ids(&self, lo: usize, hi: usize) -> impl DoubleEndedIterator<Item = RecordId> + '_ {
        self.entries[lo..hi].iter().map(|(_, id)| *id)
    }

    /// Distinct keys in ascending order.
    pub fn distinct_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = Vec::new();
        for (k, _) in &self.entries {
            if keys.last() != Some(k) {
                keys.push(k.clone());
            }
        }
        keys
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a reference to the underlying entries.
    pub fn entries(&self) -> &[(Key, RecordId)] {
        &self.entries
    }
}

impl Default for SortedIndex {
    fn default() -> Self {
        Self::new()
    }
}
