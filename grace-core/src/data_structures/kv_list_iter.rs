use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::data_structures::internal::{KvNode, MarkedPtr, NodePtr};

/// Ascending iterator over the active entries of a
/// [`KvList`](crate::data_structures::KvList).
///
/// Borrowed from the read-side guard, the section stays open while it lives.
/// Entries inserted or removed concurrently may or may not be observed.
pub struct Iter<'g, K, V> {
    curr: NodePtr<K, V>,
    _guard: PhantomData<&'g KvNode<K, V>>,
}

impl<K, V> Iter<'_, K, V> {
    pub(crate) fn new(first: NodePtr<K, V>) -> Self {
        Iter {
            curr: first,
            _guard: PhantomData,
        }
    }
}

impl<'g, K, V> Iterator for Iter<'g, K, V> {
    type Item = (&'g K, &'g V);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.curr.is_null() {
            // SAFETY: nodes reached under the guard outlive it.
            let node: &'g KvNode<K, V> = unsafe { &*self.curr };
            let next = MarkedPtr::new(node.load_next());
            self.curr = next.as_ptr();

            // Skip logically removed nodes without helping, iteration is
            // read-only.
            //
            if !next.is_marked() {
                return Some((node.key(), node.value()));
            }
        }
        None
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
