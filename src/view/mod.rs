//! View adapters: the consuming side of the engine.
//!
//! An adapter binds one dimension (and usually one group), turns user gestures
//! into filter calls, and renders a serializable snapshot. The host redraws
//! every adapter after any gesture.

pub mod charts;
pub mod dashboard;
pub mod map;
pub mod table;

use serde::Serialize;

use crate::engine::{CrossFilter, DimensionId};
use crate::types::{Key, XfResult};

pub use charts::{CategoryChart, ChartKind, LineChart};
pub use dashboard::{Dashboard, DashboardConfig, DashboardSnapshot, RedrawHook, View};
pub use map::{GeoBounds, MarkerMap, MarkerReducer, MarkerValue};
pub use table::{DataTable, SortOrder, TableColumn};

/// A user interaction with one view.
#[derive(Debug, Clone)]
pub enum Gesture {
    /// Click a slice or bar: toggle its key in the selection.
    ToggleKey(Key),
    /// Brush the half-open key range `[from, to)`.
    Brush { from: Key, to: Key },
    /// Drop the brush.
    ClearBrush,
    /// Click a column header.
    SortBy(String),
    /// Jump to a zero-based page.
    Page(usize),
    NextPage,
    PrevPage,
    /// Restrict the map to a bounding box.
    Area(GeoBounds),
    /// Drop the map area.
    ClearArea,
}

/// One slice, bar or point of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub key: Key,
    pub value: u64,
    pub selected: bool,
}

/// One marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub geo: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: u64,
    pub environment: Option<String>,
}

/// Rendered content of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewBody {
    /// Pie slices in key order.
    Pie { slices: Vec<Slice> },
    /// Row bars, largest first.
    Rows { bars: Vec<Slice> },
    /// Time series points in key order.
    Line {
        domain: Option<(Key, Key)>,
        points: Vec<Slice>,
        brush: Option<(Key, Key)>,
    },
    /// One page of the data table.
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        sort_column: String,
        sort_order: SortOrder,
        page: usize,
        page_count: usize,
        total: usize,
    },
    /// Visible map markers.
    Map { markers: Vec<Marker> },
    /// The view's group failed; nothing trustworthy to show.
    Failed { reason: String },
}

/// What a view renders after a redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub name: String,
    /// Whether this view's own filter is active (shows its reset control).
    pub filtered: bool,
    pub body: ViewBody,
}

/// The contract every chart, table and map satisfies.
pub trait ViewAdapter<T: 'static> {
    /// Display name.
    fn name(&self) -> &str;

    /// The dimension this view filters and reads.
    fn dimension(&self) -> DimensionId;

    /// Render from the coordinator's current state.
    fn render(&self, xf: &CrossFilter<T>) -> XfResult<ViewSnapshot>;

    /// Apply a gesture. Returns `false` if the gesture means nothing to this view.
    fn apply(&mut self, gesture: &Gesture, xf: &mut CrossFilter<T>) -> XfResult<bool>;

    /// Drop this view's own filter and local state.
    fn reset(&mut self, xf: &mut CrossFilter<T>) -> XfResult<()>;

    /// Whether this view's dimension currently filters anything.
    fn has_filter(&self, xf: &CrossFilter<T>) -> bool {
        xf.current_filter(self.dimension())
            .map(|f| !f.is_all())
            .unwrap_or(false)
    }
}
