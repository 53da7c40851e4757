//! Index structures for dimension filtering. Indexes reflect the full dataset; filters only select runs of them.

pub mod filter;
pub mod sorted_index;

pub use filter::Filter;
pub use sorted_index::SortedIndex;
