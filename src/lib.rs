//! SAR cross-filter: a multidimensional cross-filter engine for
//! search-and-rescue incident dashboards.
//!
//! Several views share one in-memory dataset. Each view filters its own
//! dimension, and each view's aggregate reflects every *other* view's filter.
//! Filter changes propagate as deltas, so groups update incrementally.

pub mod cli;
pub mod engine;
pub mod index;
pub mod ingest;
pub mod types;
pub mod view;

// Re-export commonly used types at the crate root
pub use engine::{
    Count, CrossFilter, Dimension, DimensionId, FilterDelta, FnReducer, Group, GroupHandle,
    GroupOptions, RecordStore, ReduceResult, Reducer, Sum,
};
pub use index::{Filter, SortedIndex};
pub use ingest::{load_incidents, load_incidents_from_path, RawIncidentRow};
pub use types::{
    Incident, IncidentBuilder, Key, RecordId, XfError, XfResult, DATE_FORMAT, DEFAULT_PAGE_SIZE,
    MAX_DIMENSIONS,
};
pub use view::{
    Dashboard, DashboardConfig, DashboardSnapshot, GeoBounds, Gesture, View, ViewAdapter,
    ViewBody, ViewSnapshot,
};
