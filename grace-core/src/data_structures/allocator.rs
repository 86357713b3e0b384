//! Node allocation for the lock-free collections.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::ListError;

/// Source of memory for collection nodes.
///
/// Retired nodes are released on whichever thread completes their grace
/// period, with a clone of the allocator the collection was built with.
pub trait NodeAllocator: Clone + Send + Sync + 'static {
    /// Allocates memory for `layout`, which always has a non-zero size.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ListError>;

    /// Releases memory obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    /// `ptr` must come from `allocate` on this allocator (or a clone of it)
    /// with the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Allocates from the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalNodeAllocator;

impl NodeAllocator for GlobalNodeAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ListError> {
        debug_assert!(layout.size() > 0);
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(ListError::Allocation {
            size: layout.size(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}
