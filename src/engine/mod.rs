//! The cross-filter engine: record store, dimensions, groups and the coordinator.

pub mod crossfilter;
pub mod dimension;
pub mod group;
pub mod reducer;
pub mod store;

pub use crossfilter::{CrossFilter, DimensionId, GroupHandle};
pub use dimension::{Dimension, FilterDelta, KeyFn};
pub use group::{Group, GroupKeyFn, GroupOptions};
pub use reducer::{Count, FnReducer, ReduceResult, Reducer, Sum};
pub use store::RecordStore;
