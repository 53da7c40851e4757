//! Reducers: the (initial, add, remove) triple behind every group.
//!
//! `remove` must undo `add` exactly: `remove(add(acc, r), r) == acc`. Groups
//! rely on this to stay history-independent; it is not checked at runtime.

use std::fmt;
use std::marker::PhantomData;

/// Result of one reducer step. The error is a human-readable reason.
pub type ReduceResult<A> = Result<A, String>;

/// Accumulation semantics of a group.
pub trait Reducer<T>: 'static {
    /// Accumulator value per group key.
    type Acc: Clone + PartialEq + fmt::Debug + 'static;

    /// The empty accumulator.
    fn initial(&self) -> Self::Acc;

    /// Fold a record that became active into the accumulator.
    fn add(&self, acc: Self::Acc, record: &T) -> ReduceResult<Self::Acc>;

    /// Remove a record that became inactive from the accumulator.
    fn remove(&self, acc: Self::Acc, record: &T) -> ReduceResult<Self::Acc>;
}

/// Counts active records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl<T> Reducer<T> for Count {
    type Acc = u64;

    fn initial(&self) -> u64 {
        0
    }

    fn add(&self, acc: u64, _record: &T) -> ReduceResult<u64> {
        Ok(acc + 1)
    }

    fn remove(&self, acc: u64, _record: &T) -> ReduceResult<u64> {
        acc.checked_sub(1)
            .ok_or_else(|| "count would drop below zero".to_string())
    }
}

/// Sums an integer value of each active record.
pub struct Sum<F> {
    value: F,
}

impl<F> Sum<F> {
    /// Sum `value(record)` over active records.
    pub fn new(value: F) -> Self {
        Self { value }
    }
}

impl<T, F> Reducer<T> for Sum<F>
where
    F: Fn(&T) -> i64 + 'static,
{
    type Acc = i64;

    fn initial(&self) -> i64 {
        0
    }

    fn add(&self, acc: i64, record: &T) -> ReduceResult<i64> {
        acc.checked_add((self.value)(record))
            .ok_or_else(|| "sum overflow".to_string())
    }

    fn remove(&self, acc: i64, record: &T) -> ReduceResult<i64> {
        acc.checked_sub((self.value)(record))
            .ok_or_else(|| "sum overflow".to_string())
    }
}

type StepFn<T, A> = Box<dyn Fn(A, &T) -> ReduceResult<A>>;

/// A reducer assembled from three closures.
pub struct FnReducer<T, A> {
    initial: Box<dyn Fn() -> A>,
    add: StepFn<T, A>,
    remove: StepFn<T, A>,
    _record: PhantomData<fn(&T)>,
}

impl<T, A> FnReducer<T, A> {
    /// Build a reducer from `initial`, `add` and `remove`.
    pub fn new(
        initial: impl Fn() -> A + 'static,
        add: impl Fn(A, &T) -> ReduceResult<A> + 'static,
        remove: impl Fn(A, &T) -> ReduceResult<A> + 'static,
    ) -> Self {
        Self {
            initial: Box::new(initial),
            add: Box::new(add),
            remove: Box::new(remove),
            _record: PhantomData,
        }
    }
}

impl<T: 'static, A> Reducer<T> for FnReducer<T, A>
where
    A: Clone + PartialEq + fmt::Debug + 'static,
{
    type Acc = A;

    fn initial(&self) -> A {
        (self.initial)()
    }

    fn add(&self, acc: A, record: &T) -> ReduceResult<A> {
        (self.add)(acc, record)
    }

    fn remove(&self, acc: A, record: &T) -> ReduceResult<A> {
        (self.remove)(acc, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_underflow_is_an_error() {
        let r = Count;
        assert!(Reducer::<()>::remove(&r, 0, &()).is_err());
        assert_eq!(Reducer::<()>::add(&r, 0, &()), Ok(1));
    }

    #[test]
    fn fn_reducer_delegates() {
        let r: FnReducer<i64, i64> = FnReducer::new(|| 0, |a, v| Ok(a.max(*v)), |a, _| Ok(a));
        assert_eq!(r.initial(), 0);
        assert_eq!(r.add(3, &7), Ok(7));
    }
}
