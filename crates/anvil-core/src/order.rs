//! Ordering of extensions within a tier
//!
//! Extensions carry an optional integer order; lower values run first and a
//! missing value behaves like [`LOWEST_PRECEDENCE`]. The sorter is stable so
//! that extensions with equal keys keep their lookup order.

use std::cmp::Ordering;

/// Order value that sorts ahead of everything else
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Order value that sorts behind everything else
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Anything that may carry an explicit order value
pub trait Ordered {
    /// Explicit order value, if any
    fn order(&self) -> Option<i32>;
}

/// Comparator used to order extensions within a tier
///
/// A factory may install its own comparator; otherwise
/// [`DefaultOrderComparator`] is used.
pub trait OrderComparator: Send + Sync {
    fn compare(&self, a: &dyn Ordered, b: &dyn Ordered) -> Ordering;
}

/// Orders by explicit order value, treating a missing value as lowest precedence
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOrderComparator;

impl OrderComparator for DefaultOrderComparator {
    fn compare(&self, a: &dyn Ordered, b: &dyn Ordered) -> Ordering {
        let a = a.order().unwrap_or(LOWEST_PRECEDENCE);
        let b = b.order().unwrap_or(LOWEST_PRECEDENCE);
        a.cmp(&b)
    }
}

/// Sort extensions in place with the given comparator or the default one
pub fn sort_processors<T: Ordered>(items: &mut [T], comparator: Option<&dyn OrderComparator>) {
    let comparator = comparator.unwrap_or(&DefaultOrderComparator);
    // slice::sort_by is stable
    items.sort_by(|a, b| comparator.compare(a, b));
}
