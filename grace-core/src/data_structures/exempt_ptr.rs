use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;

use grace_rcu::{Flavor, Rcu};

use crate::data_structures::internal::OwnedNode;
use crate::data_structures::{GlobalNodeAllocator, NodeAllocator};

/// A node extracted from a list but not destroyed yet.
///
/// The holder can keep reading the key and value for as long as it likes.
/// Releasing the handle, explicitly or by dropping it, hands the node to the
/// list's reclamation domain, which destroys it after a grace period.
///
/// Releasing inside a read-side critical section is allowed: the node is
/// queued and destroyed by the next grace period driven outside of one.
pub struct ExemptPtr<K, V, F, A = GlobalNodeAllocator>
where
    K: Send + 'static,
    V: Send + 'static,
    F: Flavor,
    A: NodeAllocator,
{
    node: ManuallyDrop<OwnedNode<K, V>>,
    rcu: Rcu<F>,
    alloc: A,
}

impl<K, V, F, A> ExemptPtr<K, V, F, A>
where
    K: Send + 'static,
    V: Send + 'static,
    F: Flavor,
    A: NodeAllocator,
{
    pub(crate) fn new(node: OwnedNode<K, V>, rcu: Rcu<F>, alloc: A) -> Self {
        ExemptPtr {
            node: ManuallyDrop::new(node),
            rcu,
            alloc,
        }
    }

    pub fn key(&self) -> &K {
        self.node.get().key()
    }

    pub fn value(&self) -> &V {
        self.node.get().value()
    }

    /// Hands the node over to reclamation.
    pub fn release(self) {
        drop(self)
    }
}

impl<K, V, F, A> Drop for ExemptPtr<K, V, F, A>
where
    K: Send + 'static,
    V: Send + 'static,
    F: Flavor,
    A: NodeAllocator,
{
    fn drop(&mut self) {
        // SAFETY: the node is taken exactly once, here.
        let node = unsafe { ManuallyDrop::take(&mut self.node) };
        let alloc = self.alloc.clone();

        // SAFETY: the deferred action runs after a grace period.
        self.rcu.defer(move || unsafe { node.destroy(&alloc) });
    }
}

impl<K, V, F, A> Deref for ExemptPtr<K, V, F, A>
where
    K: Send + 'static,
    V: Send + 'static,
    F: Flavor,
    A: NodeAllocator,
{
    type Target = V;

    fn deref(&self) -> &V {
        self.value()
    }
}

impl<K, V, F, A> fmt::Debug for ExemptPtr<K, V, F, A>
where
    K: Send + fmt::Debug + 'static,
    V: Send + fmt::Debug + 'static,
    F: Flavor,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExemptPtr")
            .field("key", self.key())
            .field("value", self.value())
            .finish()
    }
}
