use std::alloc::Layout;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::data_structures::NodeAllocator;
use crate::error::Result;

pub(crate) type NodePtr<K, V> = *mut KvNode<K, V>;

/// Key/value node of the ordered list.
///
/// The key never changes once the node is built. The value is only ever
/// handed out by shared reference.
pub(crate) struct KvNode<K, V> {
    key: K,
    value: V,
    next: AtomicPtr<KvNode<K, V>>,
}

impl<K, V> KvNode<K, V> {
    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// The successor link. Its mark bit flags this node as removed.
    #[inline]
    pub(crate) fn next(&self) -> &AtomicPtr<KvNode<K, V>> {
        &self.next
    }

    #[inline]
    pub(crate) fn load_next(&self) -> NodePtr<K, V> {
        self.next.load(Ordering::Acquire)
    }

    fn layout() -> Layout {
        Layout::new::<KvNode<K, V>>()
    }

    /// Drops the node in place and returns its memory.
    ///
    /// # Safety
    /// `node` must have been built by [`NodeBox::new`] with `alloc` (or a
    /// clone of it) and nobody may reach it anymore.
    pub(crate) unsafe fn destroy<A: NodeAllocator>(node: NonNull<KvNode<K, V>>, alloc: &A) {
        unsafe {
            ptr::drop_in_place(node.as_ptr());
            alloc.deallocate(node.cast(), Self::layout());
        }
    }
}

// =============================================================================
// NODE OWNERSHIP
// =============================================================================
//
// allocate ──► NodeBox ──publish──► list ──unlink──► OwnedNode ──► retire ──► destroy
//                 │                                      │
//                 └── drop: destroy (never published)    └── ExemptPtr holds it meanwhile
//
// Each arrow consumes the previous owner, so a node has exactly one party
// with destructive authority at any time.
//

/// A node that has been allocated but not linked yet. Dropping it frees the
/// node immediately since no reader can have seen it.
pub(crate) struct NodeBox<'a, K, V, A: NodeAllocator> {
    node: NonNull<KvNode<K, V>>,
    alloc: &'a A,
}

impl<'a, K, V, A: NodeAllocator> NodeBox<'a, K, V, A> {
    pub(crate) fn new(alloc: &'a A, key: K, value: V) -> Result<Self> {
        let node = alloc.allocate(KvNode::<K, V>::layout())?.cast::<KvNode<K, V>>();
        unsafe {
            node.as_ptr().write(KvNode {
                key,
                value,
                next: AtomicPtr::new(ptr::null_mut()),
            });
        }
        Ok(NodeBox { node, alloc })
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        unsafe { self.node.as_ref() }.key()
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> NodePtr<K, V> {
        self.node.as_ptr()
    }

    /// Sets the successor before the node is published.
    #[inline]
    pub(crate) fn set_next(&self, next: NodePtr<K, V>) {
        unsafe { self.node.as_ref() }
            .next
            .store(next, Ordering::Relaxed);
    }

    /// Ownership moves to the list, which made the node reachable.
    pub(crate) fn publish(self) -> NonNull<KvNode<K, V>> {
        let node = self.node;
        mem::forget(self);
        node
    }
}

impl<K, V, A: NodeAllocator> Drop for NodeBox<'_, K, V, A> {
    fn drop(&mut self) {
        unsafe { KvNode::destroy(self.node, self.alloc) };
    }
}

/// A node unlinked from the list by the thread holding this value. Readers
/// that started earlier may still see it, so it can only be destroyed after
/// a grace period.
pub(crate) struct OwnedNode<K, V> {
    node: NonNull<KvNode<K, V>>,
}

// The node moves to whichever thread completes its grace period.
unsafe impl<K: Send, V: Send> Send for OwnedNode<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for OwnedNode<K, V> {}

impl<K, V> OwnedNode<K, V> {
    /// # Safety
    /// `node` must be unlinked, and the caller must be the thread whose mark
    /// removed it.
    pub(crate) unsafe fn from_unlinked(node: NonNull<KvNode<K, V>>) -> Self {
        OwnedNode { node }
    }

    #[inline]
    pub(crate) fn get(&self) -> &KvNode<K, V> {
        unsafe { self.node.as_ref() }
    }

    /// # Safety
    /// A grace period must have elapsed since the node was unlinked.
    pub(crate) unsafe fn destroy<A: NodeAllocator>(self, alloc: &A) {
        unsafe { KvNode::destroy(self.node, alloc) };
    }
}
