//! Pie, row and line charts over a counting group.

use std::collections::BTreeSet;

use super::{Gesture, Slice, ViewAdapter, ViewBody, ViewSnapshot};
use crate::engine::{Count, CrossFilter, DimensionId, GroupHandle};
use crate::index::Filter;
use crate::types::{Key, XfResult};

/// How a categorical chart lays out its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Slices in key order.
    Pie,
    /// Bars ranked by count.
    Row,
}

/// Pie or row chart: clicking entries toggles them in a key-set filter.
pub struct CategoryChart {
    name: String,
    kind: ChartKind,
    dimension: DimensionId,
    group: GroupHandle<Count>,
    selected: BTreeSet<Key>,
}

impl CategoryChart {
    /// A pie chart.
    pub fn pie(name: &str, dimension: DimensionId, group: GroupHandle<Count>) -> Self {
        Self::new(name, ChartKind::Pie, dimension, group)
    }

    /// A ranked row chart.
    pub fn row(name: &str, dimension: DimensionId, group: GroupHandle<Count>) -> Self {
        Self::new(name, ChartKind::Row, dimension, group)
    }

    fn new(name: &str, kind: ChartKind, dimension: DimensionId, group: GroupHandle<Count>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            dimension,
            group,
            selected: BTreeSet::new(),
        }
    }

    /// Currently selected keys.
    pub fn selected(&self) -> &BTreeSet<Key> {
        &self.selected
    }

    fn slice(&self, key: Key, value: u64) -> Slice {
        let selected = self.selected.contains(&key);
        Slice {
            key,
            value,
            selected,
        }
    }
}

impl<T: 'static> ViewAdapter<T> for CategoryChart {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> DimensionId {
        self.dimension
    }

    fn render(&self, xf: &CrossFilter<T>) -> XfResult<ViewSnapshot> {
        let entries = match self.kind {
            ChartKind::Pie => xf.all(self.group)?,
            ChartKind::Row => xf.top_groups(self.group, usize::MAX)?,
        };
        let slices: Vec<Slice> = entries
            .into_iter()
            .map(|(key, value)| self.slice(key, value))
            .collect();
        let body = match self.kind {
            ChartKind::Pie => ViewBody::Pie { slices },
            ChartKind::Row => ViewBody::Rows { bars: slices },
        };
        Ok(ViewSnapshot {
            name: self.name.clone(),
            filtered: !self.selected.is_empty(),
            body,
        })
    }

    fn apply(&mut self, gesture: &Gesture, xf: &mut CrossFilter<T>) -> XfResult<bool> {
        let Gesture::ToggleKey(key) = gesture else {
            return Ok(false);
        };
        let mut next = self.selected.clone();
        if !next.remove(key) {
            next.insert(key.clone());
        }
        let filter = if next.is_empty() {
            Filter::All
        } else {
            Filter::In(next.clone())
        };
        xf.filter(self.dimension, filter)?;
        self.selected = next;
        Ok(true)
    }

    fn reset(&mut self, xf: &mut CrossFilter<T>) -> XfResult<()> {
        xf.filter_all(self.dimension)?;
        self.selected.clear();
        Ok(())
    }
}

/// Time series of counts per key; brushing filters a key range.
pub struct LineChart<T> {
    name: String,
    dimension: DimensionId,
    group: GroupHandle<Count>,
    /// Per-record value whose extent is the x-domain.
    extent: Option<Box<dyn Fn(&T) -> Key>>,
    brush: Option<(Key, Key)>,
}

impl<T> LineChart<T> {
    /// A line chart over a counting group. The x-domain spans the
    /// dimension's keys unless [`LineChart::with_extent`] says otherwise.
    pub fn new(name: &str, dimension: DimensionId, group: GroupHandle<Count>) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            group,
            extent: None,
            brush: None,
        }
    }

    /// Take the x-domain from the smallest and largest `value` over every record.
    pub fn with_extent(mut self, value: impl Fn(&T) -> Key + 'static) -> Self {
        self.extent = Some(Box::new(value));
        self
    }

    /// The active brush, if any.
    pub fn brush(&self) -> Option<&(Key, Key)> {
        self.brush.as_ref()
    }

    fn domain(&self, xf: &CrossFilter<T>) -> XfResult<Option<(Key, Key)>> {
        let Some(extent) = &self.extent else {
            let entries = xf.dimension_ref(self.dimension)?.index().entries();
            return Ok(match (entries.first(), entries.last()) {
                (Some((lo, _)), Some((hi, _))) => Some((lo.clone(), hi.clone())),
                _ => None,
            });
        };
        let mut bounds: Option<(Key, Key)> = None;
        for record in xf.records() {
            let key = extent(record);
            bounds = match bounds {
                None => Some((key.clone(), key)),
                Some((lo, hi)) if key < lo => Some((key, hi)),
                Some((lo, hi)) if key > hi => Some((lo, key)),
                kept => kept,
            };
        }
        Ok(bounds)
    }
}

impl<T: 'static> ViewAdapter<T> for LineChart<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> DimensionId {
        self.dimension
    }

    fn render(&self, xf: &CrossFilter<T>) -> XfResult<ViewSnapshot> {
        let domain = self.domain(xf)?;
        let points = xf
            .all(self.group)?
            .into_iter()
            .map(|(key, value)| {
                let selected = self
                    .brush
                    .as_ref()
                    .is_some_and(|(from, to)| *from <= key && key < *to);
                Slice {
                    key,
                    value,
                    selected,
                }
            })
            .collect();
        Ok(ViewSnapshot {
            name: self.name.clone(),
            filtered: self.brush.is_some(),
            body: ViewBody::Line {
                domain,
                points,
                brush: self.brush.clone(),
            },
        })
    }

    fn apply(&mut self, gesture: &Gesture, xf: &mut CrossFilter<T>) -> XfResult<bool> {
        match gesture {
            Gesture::Brush { from, to } => {
                xf.filter(self.dimension, Filter::range(from.clone(), to.clone()))?;
                self.brush = Some((from.clone(), to.clone()));
                Ok(true)
            }
            Gesture::ClearBrush => {
                self.reset(xf)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn reset(&mut self, xf: &mut CrossFilter<T>) -> XfResult<()> {
        xf.filter_all(self.dimension)?;
        self.brush = None;
        Ok(())
    }
}
