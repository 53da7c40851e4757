//! All data types for the cross-filter library.

pub mod error;
pub mod incident;
pub mod key;

pub use error::{XfError, XfResult};
pub use incident::{Incident, IncidentBuilder};
pub use key::Key;

/// Stable record identity: the record's insertion index in the store.
pub type RecordId = u32;

/// Date format of the `date` column and of rendered date labels.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum number of dimensions per coordinator (one filter bit each).
pub const MAX_DIMENSIONS: usize = 64;

/// Default number of rows per data table page.
pub const DEFAULT_PAGE_SIZE: usize = 5;
