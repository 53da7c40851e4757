//! Cross-filter coordinator. Owns the records, dimensions and groups, and
//! propagates every filter change to the groups it affects.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};

use super::dimension::{Dimension, FilterDelta};
use super::group::{Group, GroupKeyFn, GroupOptions, GroupSlot};
use super::reducer::{Count, Reducer};
use super::store::RecordStore;
use crate::index::Filter;
use crate::types::{Key, RecordId, XfError, XfResult, MAX_DIMENSIONS};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Handle to a dimension registered on a [`CrossFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionId {
    owner: u64,
    slot: usize,
}

impl DimensionId {
    /// Registration order of the dimension.
    pub fn index(&self) -> usize {
        self.slot
    }
}

/// Typed handle to a group registered on a [`CrossFilter`].
#[derive(Debug)]
pub struct GroupHandle<R> {
    owner: u64,
    slot: usize,
    _reducer: PhantomData<fn() -> R>,
}

impl<R> GroupHandle<R> {
    /// Registration order of the group.
    pub fn index(&self) -> usize {
        self.slot
    }
}

impl<R> Clone for GroupHandle<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for GroupHandle<R> {}

/// The cross-filter coordinator.
///
/// Each record carries one filter bit per dimension: bit `d` is set while the
/// record fails dimension `d`'s filter. A group on dimension `g` counts a
/// record iff every bit other than `g`'s is clear; whole-dataset groups
/// require every bit clear.
pub struct CrossFilter<T: 'static> {
    owner: u64,
    store: RecordStore<T>,
    dimensions: Vec<Dimension<T>>,
    groups: Vec<Box<dyn GroupSlot<T>>>,
    /// Filter bits per record, by record id.
    masks: Vec<u64>,
}

impl<T: 'static> CrossFilter<T> {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            store: RecordStore::new(),
            dimensions: Vec::new(),
            groups: Vec::new(),
            masks: Vec::new(),
        }
    }

    /// Create a coordinator over `records`.
    pub fn with_records(records: Vec<T>) -> XfResult<Self> {
        let mut xf = Self::new();
        xf.load(records)?;
        Ok(xf)
    }

    // ==================== Records ====================

    /// Replace every record. Dimensions rebuild their indexes and keep their
    /// filters; groups are recomputed from scratch.
    pub fn load(&mut self, records: Vec<T>) -> XfResult<()> {
        self.store.load(records)?;
        info!("Loaded {} records", self.store.size());
        self.rebuild();
        Ok(())
    }

    /// Normalize every row, then load. The first failing row aborts the load
    /// and the previous records stay in place.
    pub fn try_load<I, F>(&mut self, rows: I, mut normalize: F) -> XfResult<()>
    where
        I: IntoIterator,
        F: FnMut(usize, I::Item) -> XfResult<T>,
    {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| normalize(i + 1, row))
            .collect::<XfResult<Vec<T>>>()?;
        self.load(records)
    }

    fn rebuild(&mut self) {
        let records = self.store.records();
        self.masks = vec![0; records.len()];
        for (slot, dimension) in self.dimensions.iter_mut().enumerate() {
            dimension.rebuild(records);
            let bit = 1u64 << slot;
            for (id, mask) in self.masks.iter_mut().enumerate() {
                if !dimension.is_record_active(id as RecordId) {
                    *mask |= bit;
                }
            }
        }
        for group in &mut self.groups {
            Self::rebuild_group(group.as_mut(), records, &self.dimensions, &self.masks);
        }
    }

    fn rebuild_group(
        group: &mut dyn GroupSlot<T>,
        records: &[T],
        dimensions: &[Dimension<T>],
        masks: &[u64],
    ) {
        let own = group.dimension();
        let ignore = own.map_or(0, |d| 1u64 << d);
        let keys = own.map(|d| dimensions[d].keys());
        group.rebuild(records, keys, &|id| masks[id as usize] & !ignore == 0);
    }

    /// Number of records.
    pub fn size(&self) -> usize {
        self.store.size()
    }

    /// Get a record by id.
    pub fn get(&self, id: RecordId) -> XfResult<&T> {
        self.store.try_get(id)
    }

    /// All records in id order, filtered or not.
    pub fn records(&self) -> &[T] {
        self.store.records()
    }

    /// Whether the record passes every dimension's filter.
    pub fn is_selected(&self, id: RecordId) -> bool {
        self.masks.get(id as usize).is_some_and(|m| *m == 0)
    }

    /// Number of records passing every dimension's filter.
    pub fn selected_count(&self) -> usize {
        self.masks.iter().filter(|m| **m == 0).count()
    }

    // ==================== Dimensions ====================

    /// Register a dimension keyed by `key_fn`.
    pub fn dimension(&mut self, key_fn: impl Fn(&T) -> Key + 'static) -> XfResult<DimensionId> {
        self.register(None, Box::new(key_fn))
    }

    /// Register a dimension under a name.
    pub fn named_dimension(
        &mut self,
        name: &str,
        key_fn: impl Fn(&T) -> Key + 'static,
    ) -> XfResult<DimensionId> {
        self.register(Some(name.to_string()), Box::new(key_fn))
    }

    fn register(
        &mut self,
        name: Option<String>,
        key_fn: super::dimension::KeyFn<T>,
    ) -> XfResult<DimensionId> {
        if self.dimensions.len() >= MAX_DIMENSIONS {
            return Err(XfError::TooManyDimensions(MAX_DIMENSIONS));
        }
        let slot = self.dimensions.len();
        debug!("Registering dimension {} ({:?})", slot, name);
        self.dimensions
            .push(Dimension::new(name, key_fn, self.store.records()));
        Ok(DimensionId {
            owner: self.owner,
            slot,
        })
    }

    /// Look up a dimension by name.
    pub fn dimension_by_name(&self, name: &str) -> Option<DimensionId> {
        self.dimensions
            .iter()
            .position(|d| d.name() == Some(name))
            .map(|slot| DimensionId {
                owner: self.owner,
                slot,
            })
    }

    fn slot(&self, dim: DimensionId) -> XfResult<usize> {
        if dim.owner != self.owner || dim.slot >= self.dimensions.len() {
            return Err(XfError::DimensionNotFound(dim.slot));
        }
        Ok(dim.slot)
    }

    /// Borrow a dimension.
    pub fn dimension_ref(&self, dim: DimensionId) -> XfResult<&Dimension<T>> {
        let slot = self.slot(dim)?;
        Ok(&self.dimensions[slot])
    }

    /// Replace a dimension's filter and bring every affected group up to date
    /// before returning.
    ///
    /// Groups on `dim` itself are never touched. A reducer failure marks only
    /// that group failed; its index is listed in the returned delta.
    pub fn filter(&mut self, dim: DimensionId, filter: Filter) -> XfResult<FilterDelta> {
        let slot = self.slot(dim)?;
        let mut delta = self.dimensions[slot].set_filter(filter)?;
        if delta.is_empty() {
            return Ok(delta);
        }

        let bit = 1u64 << slot;
        for &id in &delta.entered {
            self.masks[id as usize] &= !bit;
        }
        for &id in &delta.left {
            self.masks[id as usize] |= bit;
        }

        let records = self.store.records();
        for (index, group) in self.groups.iter_mut().enumerate() {
            let own = group.dimension();
            if own == Some(slot) || group.is_failed() {
                continue;
            }
            let ignore = bit | own.map_or(0, |d| 1u64 << d);
            let changes = delta
                .entered
                .iter()
                .map(|&id| (id, true))
                .chain(delta.left.iter().map(|&id| (id, false)));
            for (id, entering) in changes {
                if self.masks[id as usize] & !ignore != 0 {
                    continue;
                }
                if group
                    .update(&records[id as usize], id, entering)
                    .is_err()
                {
                    delta.failed_groups.push(index);
                    break;
                }
            }
        }

        debug!(
            "Dimension {} filter changed {} records ({} entered, {} left)",
            slot,
            delta.len(),
            delta.entered.len(),
            delta.left.len()
        );
        if !delta.failed_groups.is_empty() {
            warn!("Groups failed during propagation: {:?}", delta.failed_groups);
        }
        Ok(delta)
    }

    /// Clear a dimension's filter.
    pub fn filter_all(&mut self, dim: DimensionId) -> XfResult<FilterDelta> {
        self.filter(dim, Filter::All)
    }

    /// Clear every dimension's filter.
    pub fn filter_none(&mut self) -> XfResult<()> {
        for slot in 0..self.dimensions.len() {
            self.filter(
                DimensionId {
                    owner: self.owner,
                    slot,
                },
                Filter::All,
            )?;
        }
        Ok(())
    }

    /// The dimension's current filter.
    pub fn current_filter(&self, dim: DimensionId) -> XfResult<&Filter> {
        Ok(self.dimension_ref(dim)?.filter())
    }

    /// Whether the record passes this dimension's own filter.
    pub fn is_record_active(&self, dim: DimensionId, id: RecordId) -> XfResult<bool> {
        Ok(self.dimension_ref(dim)?.is_record_active(id))
    }

    /// Up to `n` selected records with the largest keys, largest first.
    pub fn top(&self, dim: DimensionId, n: usize) -> XfResult<Vec<&T>> {
        self.page(dim, true, 0, n)
    }

    /// Up to `n` selected records with the smallest keys, smallest first.
    pub fn bottom(&self, dim: DimensionId, n: usize) -> XfResult<Vec<&T>> {
        self.page(dim, false, 0, n)
    }

    /// Selected records in key order, skipping `offset` and taking `limit`.
    pub fn page(
        &self,
        dim: DimensionId,
        descending: bool,
        offset: usize,
        limit: usize,
    ) -> XfResult<Vec<&T>> {
        let dimension = self.dimension_ref(dim)?;
        let records = self.store.records();
        Ok(dimension
            .ordered_ids(descending, |id| self.is_selected(id))
            .skip(offset)
            .take(limit)
            .map(|id| &records[id as usize])
            .collect())
    }

    // ==================== Groups ====================

    /// Group `dim` by `key_fn` with the default options.
    pub fn group<R: Reducer<T>>(
        &mut self,
        dim: DimensionId,
        key_fn: impl Fn(&Key) -> Key + 'static,
        reducer: R,
    ) -> XfResult<GroupHandle<R>> {
        self.group_with(dim, key_fn, reducer, GroupOptions::default())
    }

    /// Group `dim` by `key_fn`.
    pub fn group_with<R: Reducer<T>>(
        &mut self,
        dim: DimensionId,
        key_fn: impl Fn(&Key) -> Key + 'static,
        reducer: R,
        options: GroupOptions,
    ) -> XfResult<GroupHandle<R>> {
        let slot = self.slot(dim)?;
        Ok(self.attach(Some(slot), Box::new(key_fn), reducer, options))
    }

    /// Count records per dimension key.
    pub fn group_count(&mut self, dim: DimensionId) -> XfResult<GroupHandle<Count>> {
        self.group(dim, Key::clone, Count)
    }

    /// A single-bucket group over every dimension's filter, with no exclusion.
    pub fn group_all<R: Reducer<T>>(&mut self, reducer: R) -> GroupHandle<R> {
        self.attach(
            None,
            Box::new(|_: &Key| Key::unit()),
            reducer,
            GroupOptions::default(),
        )
    }

    fn attach<R: Reducer<T>>(
        &mut self,
        dimension: Option<usize>,
        key_fn: GroupKeyFn,
        reducer: R,
        options: GroupOptions,
    ) -> GroupHandle<R> {
        let slot = self.groups.len();
        let mut group: Box<dyn GroupSlot<T>> =
            Box::new(Group::new(slot, dimension, key_fn, reducer, options));
        Self::rebuild_group(
            group.as_mut(),
            self.store.records(),
            &self.dimensions,
            &self.masks,
        );
        self.groups.push(group);
        GroupHandle {
            owner: self.owner,
            slot,
            _reducer: PhantomData,
        }
    }

    /// Borrow a group through its typed handle.
    pub fn group_ref<R: Reducer<T>>(&self, handle: GroupHandle<R>) -> XfResult<&Group<T, R>> {
        if handle.owner != self.owner {
            return Err(XfError::GroupNotFound(handle.slot));
        }
        self.groups
            .get(handle.slot)
            .and_then(|g| g.as_any().downcast_ref::<Group<T, R>>())
            .ok_or(XfError::GroupNotFound(handle.slot))
    }

    /// All (group key, accumulator) pairs of a group.
    pub fn all<R: Reducer<T>>(&self, handle: GroupHandle<R>) -> XfResult<Vec<(Key, R::Acc)>> {
        self.group_ref(handle)?.all()
    }

    /// The `n` largest entries of a group.
    pub fn top_groups<R>(&self, handle: GroupHandle<R>, n: usize) -> XfResult<Vec<(Key, R::Acc)>>
    where
        R: Reducer<T>,
        R::Acc: Ord,
    {
        self.group_ref(handle)?.top(n)
    }

    /// The accumulator of a whole-dataset group.
    pub fn value<R: Reducer<T>>(&self, handle: GroupHandle<R>) -> XfResult<R::Acc> {
        self.group_ref(handle)?.value()
    }
}

impl<T: 'static> Default for CrossFilter<T> {
    fn default() -> Self {
        Self::new()
    }
}
