//! Record store: the immutable, ordered record sequence every dimension shares.

use crate::types::{RecordId, XfError, XfResult};

/// Holds the loaded records. A record's id is its position.
pub struct RecordStore<T> {
    records: Vec<T>,
}

impl<T> RecordStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Replace the contents. Ids are reassigned from zero.
    pub fn load(&mut self, records: Vec<T>) -> XfResult<()> {
        if records.len() > RecordId::MAX as usize {
            return Err(XfError::TooManyRecords(records.len()));
        }
        self.records = records;
        Ok(())
    }

    /// Get a record by id.
    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.records.get(id as usize)
    }

    /// Get a record by id, failing when out of range.
    pub fn try_get(&self, id: RecordId) -> XfResult<&T> {
        self.get(id).ok_or(XfError::RecordNotFound(id))
    }

    /// Number of records.
    pub fn size(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in id order.
    pub fn records(&self) -> &[T] {
        &self.records
    }
}

impl<T> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
