//! Dimension: a derived sort key over every record plus that key's filter.

use log::debug;

use crate::index::{Filter, SortedIndex};
use crate::types::{Key, RecordId, XfResult};

/// Key function of a dimension.
pub type KeyFn<T> = Box<dyn Fn(&T) -> Key>;

/// Records whose pass status changed because of one filter update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterDelta {
    /// Records that now pass the dimension's filter.
    pub entered: Vec<RecordId>,
    /// Records that no longer pass the dimension's filter.
    pub left: Vec<RecordId>,
    /// Groups that failed while applying this delta (see `XfError::Reducer`).
    pub failed_groups: Vec<usize>,
}

impl FilterDelta {
    /// Whether no record changed status.
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.left.is_empty()
    }

    /// Number of records that changed status.
    pub fn len(&self) -> usize {
        self.entered.len() + self.left.len()
    }
}

/// A named key over the record store with its own filter.
pub struct Dimension<T> {
    name: Option<String>,
    key_fn: KeyFn<T>,
    /// Key of each record, by record id.
    keys: Vec<Key>,
    index: SortedIndex,
    filter: Filter,
    /// Index run selected by the filter, when it is contiguous.
    bounds: Option<(usize, usize)>,
    /// Whether each record passes this dimension's filter, by record id.
    passes: Vec<bool>,
}

impl<T> Dimension<T> {
    /// Create a dimension and build its index over `records`.
    pub fn new(name: Option<String>, key_fn: KeyFn<T>, records: &[T]) -> Self {
        let mut dimension = Self {
            name,
            key_fn,
            keys: Vec::new(),
            index: SortedIndex::new(),
            filter: Filter::All,
            bounds: None,
            passes: Vec::new(),
        };
        dimension.rebuild(records);
        dimension
    }

    /// Rebuild keys and index from scratch, keeping the current filter.
    pub fn rebuild(&mut self, records: &[T]) {
        self.keys = records.iter().map(|r| (self.key_fn)(r)).collect();
        self.index.rebuild(self.keys.iter().cloned());
        self.bounds = self.filter.bounds(&self.index);
        self.passes = match self.bounds {
            Some((lo, hi)) => {
                let mut passes = vec![false; self.keys.len()];
                for id in self.index.ids(lo, hi) {
                    passes[id as usize] = true;
                }
                passes
            }
            None => self.keys.iter().map(|k| self.filter.matches(k)).collect(),
        };
        debug!(
            "Rebuilt dimension {:?}: {} entries",
            self.name,
            self.index.len()
        );
    }

    /// Replace the filter and return the records whose status changed.
    ///
    /// Contiguous filters move the two run boundaries and only visit records
    /// between the old and new boundaries. Other filters scan the index once.
    /// A malformed filter is rejected before anything changes.
    pub fn set_filter(&mut self, filter: Filter) -> XfResult<FilterDelta> {
        filter.validate()?;

        let mut delta = FilterDelta::default();
        let new_bounds = filter.bounds(&self.index);

        match (self.bounds, new_bounds) {
            (Some((a, b)), Some((c, d))) => {
                if c < a {
                    delta.entered.extend(self.index.ids(c, a.min(d)));
                }
                if d > b {
                    delta.entered.extend(self.index.ids(b.max(c), d));
                }
                if a < c {
                    delta.left.extend(self.index.ids(a, c.min(b)));
                }
                if b > d {
                    delta.left.extend(self.index.ids(d.max(a), b));
                }
            }
            _ => {
                for (key, id) in self.index.entries() {
                    let now = filter.matches(key);
                    if now != self.passes[*id as usize] {
                        if now {
                            delta.entered.push(*id);
                        } else {
                            delta.left.push(*id);
                        }
                    }
                }
            }
        }

        for &id in &delta.entered {
            self.passes[id as usize] = true;
        }
        for &id in &delta.left {
            self.passes[id as usize] = false;
        }
        self.filter = filter;
        self.bounds = new_bounds;

        Ok(delta)
    }

    /// Equivalent to `set_filter(Filter::All)`.
    pub fn clear_filter(&mut self) -> FilterDelta {
        // `All` always validates.
        self.set_filter(Filter::All).unwrap_or_default()
    }

    /// Whether the record's key passes this dimension's filter.
    pub fn is_record_active(&self, id: RecordId) -> bool {
        self.passes.get(id as usize).copied().unwrap_or(false)
    }

    /// The current filter.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The dimension's name, if registered with one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Key of a record.
    pub fn key_of(&self, id: RecordId) -> Option<&Key> {
        self.keys.get(id as usize)
    }

    /// Keys of all records, by record id.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The sorted index.
    pub fn index(&self) -> &SortedIndex {
        &self.index
    }

    /// Record ids in key order (descending when `descending`), keeping those `accept` allows.
    pub fn ordered_ids<'a>(
        &'a self,
        descending: bool,
        accept: impl Fn(RecordId) -> bool + 'a,
    ) -> Box<dyn Iterator<Item = RecordId> + 'a> {
        let ids = self.index.ids(0, self.index.len());
        if descending {
            Box::new(ids.rev().filter(move |&id| accept(id)))
        } else {
            Box::new(ids.filter(move |&id| accept(id)))
        }
    }
}
