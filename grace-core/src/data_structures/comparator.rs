//! Key ordering used by the ordered collections.

use std::cmp::Ordering;

/// Total order over keys supplied when a collection is constructed.
///
/// The comparator must be consistent: equal keys compare `Equal`, and the
/// order never changes while the collection holds keys.
pub trait KeyComparator<K: ?Sized>: Send + Sync {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> KeyComparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Reverses the [`Ord`] order of keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReverseOrder;

impl<K: Ord + ?Sized> KeyComparator<K> for ReverseOrder {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        rhs.cmp(lhs)
    }
}

/// Orders keys with a closure.
///
/// ```
/// use grace_core::data_structures::{KeyComparator, OrderBy};
///
/// let by_len = OrderBy(|a: &String, b: &String| a.len().cmp(&b.len()));
/// assert!(by_len.compare(&"ab".to_string(), &"abc".to_string()).is_lt());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OrderBy<F>(pub F);

impl<K: ?Sized, F> KeyComparator<K> for OrderBy<F>
where
    F: Fn(&K, &K) -> Ordering + Send + Sync,
{
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        (self.0)(lhs, rhs)
    }
}
