// Marked pointer operations using the least significant bit as the
// logical-deletion flag.
//
// A node's `next` field carries the mark of the node itself:
//
//   0b0: active, reachable through unmarked links
//   0b1: logically removed, successor links must not change anymore
//
// Nodes are at least pointer-aligned, so bit 0 of a real address is always 0.
//
const DELETE_MARK: usize = 0b1;

/// A pointer that uses the least significant bit as a deletion mark.
#[derive(Copy, Clone)]
pub(crate) struct MarkedPtr<T> {
    ptr: *mut T,
}

impl<T> MarkedPtr<T> {
    /// Wrap a (possibly marked) pointer.
    #[inline]
    pub(crate) fn new(ptr: *mut T) -> Self {
        MarkedPtr { ptr }
    }

    /// Strip the mark bit from a raw pointer.
    #[inline]
    pub(crate) fn unmask(ptr: *mut T) -> *mut T {
        (ptr as usize & !DELETE_MARK) as *mut T
    }

    /// The pointer without the mark, the one you dereference.
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        Self::unmask(self.ptr)
    }

    /// The pointer with the mark intact, the one you compare and swap.
    #[inline]
    pub(crate) fn as_raw(&self) -> *mut T {
        self.ptr
    }

    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        (self.ptr as usize & DELETE_MARK) != 0
    }

    /// Marked version of this pointer.
    #[inline]
    pub(crate) fn marked(&self) -> Self {
        MarkedPtr {
            ptr: (self.ptr as usize | DELETE_MARK) as *mut T,
        }
    }
}

impl<T> std::fmt::Debug for MarkedPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkedPtr")
            .field("ptr", &self.as_ptr())
            .field("marked", &self.is_marked())
            .finish()
    }
}
