//! Filter predicates over dimension keys.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::SortedIndex;
use crate::types::{Key, XfError, XfResult};

/// A filter attached to one dimension.
#[derive(Clone)]
pub enum Filter {
    /// Accept every key.
    All,
    /// Accept keys equal to this key.
    Exact(Key),
    /// Accept keys in the half-open range `[lo, hi)`.
    Range { lo: Key, hi: Key },
    /// Accept keys in this set.
    In(BTreeSet<Key>),
    /// Accept keys the function accepts.
    Predicate(Arc<dyn Fn(&Key) -> bool>),
}

impl Filter {
    /// Equality filter.
    pub fn exact(key: impl Into<Key>) -> Self {
        Self::Exact(key.into())
    }

    /// Half-open range filter.
    pub fn range(lo: impl Into<Key>, hi: impl Into<Key>) -> Self {
        Self::Range {
            lo: lo.into(),
            hi: hi.into(),
        }
    }

    /// Set membership filter.
    pub fn any_of<K: Into<Key>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self::In(keys.into_iter().map(Into::into).collect())
    }

    /// Arbitrary predicate filter.
    pub fn predicate(f: impl Fn(&Key) -> bool + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Whether this is the accept-all filter.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Reject malformed filters.
    pub fn validate(&self) -> XfResult<()> {
        match self {
            Self::Range { lo, hi } if lo > hi => Err(XfError::InvalidFilter(format!(
                "range lower bound {} is above upper bound {}",
                lo, hi
            ))),
            Self::In(keys) if keys.is_empty() => {
                Err(XfError::InvalidFilter("empty key set".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Whether `key` passes this filter.
    pub fn matches(&self, key: &Key) -> bool {
        match self {
            Self::All => true,
            Self::Exact(k) => k == key,
            Self::Range { lo, hi } => lo <= key && key < hi,
            Self::In(keys) => keys.contains(key),
            Self::Predicate(f) => f(key),
        }
    }

    /// For filters that select one contiguous run of the sorted index, the
    /// positions `[lo, hi)` of that run.
    pub fn bounds(&self, index: &SortedIndex) -> Option<(usize, usize)> {
        match self {
            Self::All => Some((0, index.len())),
            Self::Exact(k) => Some(index.equal_range(k)),
            Self::Range { lo, hi } => Some(index.range(lo, hi)),
            Self::In(_) | Self::Predicate(_) => None,
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::All
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Exact(k) => f.debug_tuple("Exact").field(k).finish(),
            Self::Range { lo, hi } => f
                .debug_struct("Range")
                .field("lo", lo)
                .field("hi", hi)
                .finish(),
            Self::In(keys) => f.debug_tuple("In").field(keys).finish(),
            Self::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_range_is_rejected() {
        assert!(Filter::range(5i64, 1i64).validate().is_err());
        assert!(Filter::range(1i64, 1i64).validate().is_ok());
        assert!(Filter::any_of(Vec::<Key>::new()).validate().is_err());
    }

    #[test]
    fn range_is_half_open() {
        let f = Filter::range(1i64, 3i64);
        assert!(f.matches(&Key::Int(1)));
        assert!(f.matches(&Key::Int(2)));
        assert!(!f.matches(&Key::Int(3)));
    }
}
