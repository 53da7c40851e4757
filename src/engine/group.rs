//! Groups: incrementally maintained aggregations over a dimension's keys.

use std::any::Any;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use log::warn;

use super::reducer::Reducer;
use crate::types::{Key, RecordId, XfError, XfResult};

/// Maps a dimension key to a (possibly coarser) group key.
pub type GroupKeyFn = Box<dyn Fn(&Key) -> Key>;

/// Per-group settings.
#[derive(Debug, Clone, Copy)]
pub struct GroupOptions {
    /// Keep group keys whose accumulator equals `initial()` in `all()` and `top()`.
    pub keep_empty_groups: bool,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            keep_empty_groups: true,
        }
    }
}

/// An aggregation keyed by group key, maintained by the coordinator.
pub struct Group<T, R: Reducer<T>> {
    id: usize,
    /// Owning dimension slot; `None` for whole-dataset groups.
    dimension: Option<usize>,
    key_fn: GroupKeyFn,
    reducer: R,
    options: GroupOptions,
    /// Group key of each record, by record id.
    keys: Vec<Key>,
    values: BTreeMap<Key, R::Acc>,
    failure: Option<String>,
    _record: PhantomData<fn(&T)>,
}

impl<T, R: Reducer<T>> Group<T, R> {
    pub(crate) fn new(
        id: usize,
        dimension: Option<usize>,
        key_fn: GroupKeyFn,
        reducer: R,
        options: GroupOptions,
    ) -> Self {
        Self {
            id,
            dimension,
            key_fn,
            reducer,
            options,
            keys: Vec::new(),
            values: BTreeMap::new(),
            failure: None,
            _record: PhantomData,
        }
    }

    fn check(&self) -> XfResult<()> {
        match &self.failure {
            Some(reason) => Err(XfError::Reducer {
                group: self.id,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn visible(&self) -> impl Iterator<Item = (&Key, &R::Acc)> + '_ {
        let initial = self.reducer.initial();
        let keep = self.options.keep_empty_groups;
        self.values
            .iter()
            .filter(move |(_, acc)| keep || **acc != initial)
    }

    /// All (group key, accumulator) pairs in ascending key order.
    pub fn all(&self) -> XfResult<Vec<(Key, R::Acc)>> {
        self.check()?;
        Ok(self
            .visible()
            .map(|(k, acc)| (k.clone(), acc.clone()))
            .collect())
    }

    /// The `n` largest entries by `order`, ties in ascending key order.
    pub fn top_by<O: Ord>(
        &self,
        n: usize,
        order: impl Fn(&R::Acc) -> O,
    ) -> XfResult<Vec<(Key, R::Acc)>> {
        let mut entries = self.all()?;
        // Stable sort keeps ascending key order among equal accumulators.
        entries.sort_by(|a, b| order(&b.1).cmp(&order(&a.1)));
        entries.truncate(n);
        Ok(entries)
    }

    /// The `n` largest entries by accumulator.
    pub fn top(&self, n: usize) -> XfResult<Vec<(Key, R::Acc)>>
    where
        R::Acc: Ord,
    {
        self.top_by(n, |acc| acc.clone())
    }

    /// Accumulator of one group key.
    pub fn get(&self, key: &Key) -> XfResult<Option<R::Acc>> {
        self.check()?;
        Ok(self.values.get(key).cloned())
    }

    /// The single accumulator of a whole-dataset group.
    pub fn value(&self) -> XfResult<R::Acc> {
        self.check()?;
        Ok(self
            .values
            .get(&Key::unit())
            .cloned()
            .unwrap_or_else(|| self.reducer.initial()))
    }

    /// Number of group keys.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Whether a reducer failed in this group.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Handle index of this group.
    pub fn id(&self) -> usize {
        self.id
    }

    fn step(&mut self, record: &T, id: RecordId, entering: bool) -> Result<(), String> {
        let initial = self.reducer.initial();
        let slot = self
            .values
            .entry(self.keys[id as usize].clone())
            .or_insert_with(|| initial.clone());
        let acc = std::mem::replace(slot, initial);
        let next = if entering {
            self.reducer.add(acc, record)?
        } else {
            self.reducer.remove(acc, record)?
        };
        *slot = next;
        Ok(())
    }

    fn fail(&mut self, reason: String) -> String {
        warn!("Group {} failed: {}", self.id, reason);
        self.failure = Some(reason.clone());
        reason
    }
}

/// Type-erased view of a group, as stored by the coordinator.
pub(crate) trait GroupSlot<T> {
    /// Owning dimension slot.
    fn dimension(&self) -> Option<usize>;

    /// Recompute keys and accumulators from scratch.
    fn rebuild(
        &mut self,
        records: &[T],
        dimension_keys: Option<&[Key]>,
        active: &dyn Fn(RecordId) -> bool,
    );

    /// Add (`entering`) or remove one record.
    fn update(&mut self, record: &T, id: RecordId, entering: bool) -> Result<(), String>;

    fn is_failed(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static, R: Reducer<T>> GroupSlot<T> for Group<T, R> {
    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn rebuild(
        &mut self,
        records: &[T],
        dimension_keys: Option<&[Key]>,
        active: &dyn Fn(RecordId) -> bool,
    ) {
        self.failure = None;
        self.keys = match dimension_keys {
            Some(keys) => keys.iter().map(|k| (self.key_fn)(k)).collect(),
            None => vec![Key::unit(); records.len()],
        };
        self.values = self
            .keys
            .iter()
            .map(|k| (k.clone(), self.reducer.initial()))
            .collect();

        for (i, record) in records.iter().enumerate() {
            let id = i as RecordId;
            if active(id) {
                if let Err(reason) = self.step(record, id, true) {
                    self.fail(reason);
                    return;
                }
            }
        }
    }

    fn update(&mut self, record: &T, id: RecordId, entering: bool) -> Result<(), String> {
        if self.failure.is_some() {
            return Ok(());
        }
        self.step(record, id, entering)
            .map_err(|reason| self.fail(reason))
    }

    fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
