use std::fmt;
use std::ops::Deref;

use crate::data_structures::internal::KvNode;

/// Borrowed view of a node that is still linked, or was linked when the
/// enclosing read-side critical section began.
///
/// The `'g` lifetime is the borrow of the critical-section guard, so the
/// handle cannot be used after the section ends.
pub struct RawPtr<'g, K, V> {
    node: &'g KvNode<K, V>,
}

impl<'g, K, V> RawPtr<'g, K, V> {
    pub(crate) fn new(node: &'g KvNode<K, V>) -> Self {
        RawPtr { node }
    }

    pub fn key(&self) -> &'g K {
        self.node.key()
    }

    pub fn value(&self) -> &'g V {
        self.node.value()
    }
}

impl<K, V> Clone for RawPtr<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for RawPtr<'_, K, V> {}

impl<K, V> Deref for RawPtr<'_, K, V> {
    type Target = V;

    fn deref(&self) -> &V {
        self.node.value()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RawPtr<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawPtr")
            .field("key", self.key())
            .field("value", self.value())
            .finish()
    }
}
