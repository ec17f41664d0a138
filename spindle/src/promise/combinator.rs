//! Aggregation over sets of promises.
//!
//! Each combinator takes any mix of promises as `&[&dyn Observable]` and
//! returns a new promise summarizing them. Inputs that have already settled
//! are examined immediately, in index order; the rest are examined in the
//! order they settle. Once the result has settled, later input settlements
//! are ignored.
//!
//! The [`all!`](crate::all), [`any!`](crate::any), [`race!`](crate::race)
//! and [`all_settled!`](crate::all_settled) macros build the input slice
//! from a list of promise expressions.

use super::{Observable, Promise};
use crate::error::Result;

use std::cell::Cell;
use std::rc::Rc;

/// The first input of a [`race`] to settle.
#[derive(Debug, Clone)]
pub struct Winner {
    /// Position of the winning promise in the input slice.
    pub index: usize,

    /// How the winning promise settled.
    pub outcome: Result<()>,
}

/// Resolves once every input has resolved, or as soon as one rejects.
///
/// The result is `None` if all inputs resolved, or `Some(index)` of the
/// first input to reject. An empty input resolves to `None` immediately.
///
/// # Examples
///
/// ```rust,ignore
/// let failed = all(&[&fetch_a, &fetch_b]).wait()?;
/// if let Some(index) = failed {
///     println!("request {index} failed");
/// }
/// ```
pub fn all(promises: &[&dyn Observable]) -> Promise<Option<usize>> {
    let result = Promise::new();

    if promises.is_empty() {
        result.resolve(None);
        return result;
    }

    let remaining = Rc::new(Cell::new(promises.len()));

    for (index, promise) in promises.iter().enumerate() {
        let result = result.clone();
        let remaining = remaining.clone();

        promise.subscribe(Box::new(move |outcome| {
            if result.is_settled() {
                return;
            }

            match outcome {
                Ok(()) => {
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        result.resolve(None);
                    }
                }
                Err(_) => result.resolve(Some(index)),
            }
        }));
    }

    result
}

/// Resolves once every input has settled, however it settled.
///
/// Never rejects. An empty input resolves immediately.
pub fn all_settled(promises: &[&dyn Observable]) -> Promise<()> {
    let result = Promise::new();

    if promises.is_empty() {
        result.resolve(());
        return result;
    }

    let remaining = Rc::new(Cell::new(promises.len()));

    for promise in promises {
        let result = result.clone();
        let remaining = remaining.clone();

        promise.subscribe(Box::new(move |_| {
            remaining.set(remaining.get() - 1);
            if remaining.get() == 0 {
                result.resolve(());
            }
        }));
    }

    result
}

/// Resolves as soon as one input resolves, or once every input has
/// rejected.
///
/// The result is `Some(index)` of the first input to resolve, or `None` if
/// all of them rejected. An empty input resolves to `None` immediately.
pub fn any(promises: &[&dyn Observable]) -> Promise<Option<usize>> {
    let result = Promise::new();

    if promises.is_empty() {
        result.resolve(None);
        return result;
    }

    let remaining = Rc::new(Cell::new(promises.len()));

    for (index, promise) in promises.iter().enumerate() {
        let result = result.clone();
        let remaining = remaining.clone();

        promise.subscribe(Box::new(move |outcome| {
            if result.is_settled() {
                return;
            }

            match outcome {
                Ok(()) => result.resolve(Some(index)),
                Err(_) => {
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        result.resolve(None);
                    }
                }
            }
        }));
    }

    result
}

/// Resolves with whichever input settles first.
///
/// The [`Winner`] carries the input's index and whether it resolved or
/// rejected. With an empty input nothing can ever win, so the result only
/// settles (with [`Cancelled`](crate::Error::Cancelled)) once its last
/// handle is dropped.
pub fn race(promises: &[&dyn Observable]) -> Promise<Winner> {
    let result = Promise::new();

    for (index, promise) in promises.iter().enumerate() {
        let result = result.clone();

        promise.subscribe(Box::new(move |outcome| {
            if !result.is_settled() {
                result.resolve(Winner { index, outcome });
            }
        }));
    }

    result
}
