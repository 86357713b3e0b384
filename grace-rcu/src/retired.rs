use std::fmt;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

/// How a retired pointer is destroyed once its grace period has elapsed.
pub(crate) enum Disposal {
    /// A type-erased pointer together with the function that destroys it.
    Disposer {
        ptr: *mut (),
        disposer: unsafe fn(*mut ()),
    },
    /// An arbitrary deferred action.
    Deferred(Box<dyn FnOnce() + Send>),
}

impl Disposal {
    /// Type-erases `ptr` and its disposer.
    ///
    /// # Safety
    /// `disposer` must be sound to call exactly once with `ptr`, from any thread.
    pub(crate) unsafe fn from_raw<T>(ptr: *mut T, disposer: unsafe fn(*mut T)) -> Self {
        // Both function pointer types share the same ABI, only the pointee
        // type of the argument differs.
        //
        let disposer: unsafe fn(*mut ()) =
            unsafe { mem::transmute::<unsafe fn(*mut T), unsafe fn(*mut ())>(disposer) };

        Disposal::Disposer {
            ptr: ptr as *mut (),
            disposer,
        }
    }
}

/// A pointer waiting for a grace period, tagged with the control word that
/// was current when it was retired.
pub(crate) struct RetiredPtr {
    disposal: Disposal,
    generation: u32,
}

impl RetiredPtr {
    pub(crate) fn new(disposal: Disposal, generation: u32) -> Self {
        RetiredPtr {
            disposal,
            generation,
        }
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }

    /// Destroys the pointer. Consumes the record, so it runs exactly once.
    pub(crate) fn dispose(self) {
        match self.disposal {
            Disposal::Disposer { ptr, disposer } => unsafe { disposer(ptr) },
            Disposal::Deferred(action) => action(),
        }
    }
}

impl fmt::Debug for RetiredPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.disposal {
            Disposal::Disposer { ptr, .. } => format!("{ptr:p}"),
            Disposal::Deferred(_) => "deferred".to_string(),
        };
        f.debug_struct("RetiredPtr")
            .field("disposal", &kind)
            .field("generation", &self.generation)
            .finish()
    }
}

struct RetiredNode {
    retired: RetiredPtr,
    next: *mut RetiredNode,
}

/// Shared queue of retired pointers.
///
/// Producers push with a CAS on the head. The grace-period driver detaches
/// the whole chain with a single swap, so nodes are never popped one by one
/// and the push side is free of ABA.
pub(crate) struct RetireQueue {
    head: AtomicPtr<RetiredNode>,
    len: AtomicUsize,
}

// Retired pointers are handed over to whichever thread drives reclamation.
unsafe impl Send for RetireQueue {}
unsafe impl Sync for RetireQueue {}

impl RetireQueue {
    pub(crate) fn new() -> Self {
        RetireQueue {
            head: AtomicPtr::new(ptr::null_mut()),
            len: AtomicUsize::new(0),
        }
    }

    /// Queues `retired` and returns the queue length including it.
    pub(crate) fn push(&self, retired: RetiredPtr) -> usize {
        let node = Box::into_raw(Box::new(RetiredNode {
            retired,
            next: ptr::null_mut(),
        }));

        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            unsafe { (*node).next = head };
            match self
                .head
                .compare_exchange_weak(head, node, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => head = actual,
            }
        }

        self.len.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Detaches everything queued so far.
    pub(crate) fn take(&self) -> RetiredBatch {
        let head = self.head.swap(ptr::null_mut(), Ordering::Acquire);

        let mut count = 0;
        let mut curr = head;
        while !curr.is_null() {
            count += 1;
            curr = unsafe { (*curr).next };
        }
        self.len.fetch_sub(count, Ordering::Relaxed);

        RetiredBatch { head, count }
    }

    pub(crate) fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.load(Ordering::Relaxed).is_null()
    }
}

impl Drop for RetireQueue {
    fn drop(&mut self) {
        self.take().dispose();
    }
}

/// Retired pointers detached from the queue at the start of a grace period.
/// Anything not disposed explicitly is disposed on drop.
pub(crate) struct RetiredBatch {
    head: *mut RetiredNode,
    count: usize,
}

impl RetiredBatch {
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Newest generation in the batch, if any.
    pub(crate) fn newest_generation(&self) -> Option<u32> {
        if self.head.is_null() {
            None
        } else {
            Some(unsafe { (*self.head).retired.generation() })
        }
    }

    /// Disposes every pointer in the batch. Returns how many were disposed.
    pub(crate) fn dispose(mut self) -> usize {
        self.dispose_all()
    }

    fn dispose_all(&mut self) -> usize {
        let mut disposed = 0;
        let mut curr = mem::replace(&mut self.head, ptr::null_mut());
        while !curr.is_null() {
            let node = unsafe { Box::from_raw(curr) };
            curr = node.next;
            node.retired.dispose();
            disposed += 1;
        }
        self.count = 0;
        disposed
    }
}

impl Drop for RetiredBatch {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
