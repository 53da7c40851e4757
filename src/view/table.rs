//! Sortable, paginated data table over the selected records.

use serde::Serialize;

use super::{Gesture, ViewAdapter, ViewBody, ViewSnapshot};
use crate::engine::{CrossFilter, DimensionId};
use crate::types::{Key, XfError, XfResult};

/// Sort direction of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// A table column: header label and the sortable value it shows.
pub struct TableColumn<T> {
    pub label: String,
    pub value: Box<dyn Fn(&T) -> Key>,
}

impl<T> TableColumn<T> {
    pub fn new(label: &str, value: impl Fn(&T) -> Key + 'static) -> Self {
        Self {
            label: label.to_string(),
            value: Box::new(value),
        }
    }
}

/// Data table. It never filters; it lists records that pass every filter.
pub struct DataTable<T> {
    name: String,
    dimension: DimensionId,
    columns: Vec<TableColumn<T>>,
    sort_column: usize,
    sort_order: SortOrder,
    page: usize,
    page_size: usize,
}

impl<T: 'static> DataTable<T> {
    /// A table reading through `dimension`, sorted by the first column ascending.
    pub fn new(
        name: &str,
        dimension: DimensionId,
        columns: Vec<TableColumn<T>>,
        page_size: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            columns,
            sort_column: 0,
            sort_order: SortOrder::Ascending,
            page: 0,
            page_size: page_size.max(1),
        }
    }

    /// Sort by the column with this label.
    pub fn sort_by(&mut self, label: &str, order: SortOrder) -> XfResult<()> {
        self.sort_column = self.column_index(label)?;
        self.sort_order = order;
        Ok(())
    }

    fn column_index(&self, label: &str) -> XfResult<usize> {
        self.columns
            .iter()
            .position(|c| c.label == label)
            .ok_or_else(|| XfError::InvalidFilter(format!("unknown table column '{}'", label)))
    }

    fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Selected records in table order, as (sort key, record) pairs.
    fn sorted_rows<'a>(&self, xf: &'a CrossFilter<T>) -> XfResult<Vec<(Key, &'a T)>> {
        let column = self.columns.get(self.sort_column);
        let mut rows: Vec<(Key, &T)> = xf
            .page(self.dimension, false, 0, usize::MAX)?
            .into_iter()
            .map(|r| (column.map_or_else(Key::unit, |c| (c.value)(r)), r))
            .collect();
        // Stable: equal values keep dimension order.
        match self.sort_order {
            SortOrder::Ascending => rows.sort_by(|a, b| a.0.cmp(&b.0)),
            SortOrder::Descending => rows.sort_by(|a, b| b.0.cmp(&a.0)),
        }
        Ok(rows)
    }

    /// Current zero-based page.
    pub fn page(&self) -> usize {
        self.page
    }
}

impl<T: 'static> ViewAdapter<T> for DataTable<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> DimensionId {
        self.dimension
    }

    fn render(&self, xf: &CrossFilter<T>) -> XfResult<ViewSnapshot> {
        let rows = self.sorted_rows(xf)?;
        let total = rows.len();
        let page_count = self.page_count(total);
        // Filters elsewhere can shrink the row set under the current page.
        let page = self.page.min(page_count - 1);
        let rows = rows
            .into_iter()
            .skip(page * self.page_size)
            .take(self.page_size)
            .map(|(_, record)| {
                self.columns
                    .iter()
                    .map(|c| (c.value)(record).to_string())
                    .collect()
            })
            .collect();

        Ok(ViewSnapshot {
            name: self.name.clone(),
            filtered: false,
            body: ViewBody::Table {
                columns: self.columns.iter().map(|c| c.label.clone()).collect(),
                rows,
                sort_column: self
                    .columns
                    .get(self.sort_column)
                    .map(|c| c.label.clone())
                    .unwrap_or_default(),
                sort_order: self.sort_order,
                page,
                page_count,
                total,
            },
        })
    }

    fn apply(&mut self, gesture: &Gesture, xf: &mut CrossFilter<T>) -> XfResult<bool> {
        match gesture {
            Gesture::SortBy(label) => {
                let column = self.column_index(label)?;
                if column == self.sort_column {
                    self.sort_order = self.sort_order.flipped();
                } else {
                    self.sort_column = column;
                    self.sort_order = SortOrder::Ascending;
                }
                self.page = 0;
            }
            Gesture::Page(page) => {
                let last = self.page_count(xf.selected_count()) - 1;
                self.page = (*page).min(last);
            }
            Gesture::NextPage => {
                let last = self.page_count(xf.selected_count()) - 1;
                self.page = (self.page + 1).min(last);
            }
            Gesture::PrevPage => {
                self.page = self.page.saturating_sub(1);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn reset(&mut self, _xf: &mut CrossFilter<T>) -> XfResult<()> {
        self.page = 0;
        Ok(())
    }

    fn has_filter(&self, _xf: &CrossFilter<T>) -> bool {
        false
    }
}
