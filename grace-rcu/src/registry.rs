use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32, AtomicUsize, Ordering, fence};
use std::thread::{self, ThreadId};

use crossbeam_utils::CachePadded;

// =============================================================================
// THREAD REGISTRY
// =============================================================================
//
// Intrusive singly-linked list of per-thread records. New records are pushed
// at the head with a single CAS:
//
// ┌──────┐    ┌────────┐    ┌────────┐    ┌────────┐
// │ HEAD │───►│ T3 (0) │───►│ T2 (7) │───►│ T1 (R) │───► NULL
// └──────┘    └────────┘    └────────┘    └────────┘
//
//   (0) not inside a critical section
//   (7) inside a critical section that began at control word 7
//   (R) retired, waiting to be pruned by the next scan
//
// Only the grace-period driver unlinks records, and it does so while holding
// the driver lock. Attaching threads never dereference existing records, the
// owner thread only touches its own record until it retires it, so a record
// that the scan has unlinked can be freed immediately.
//

/// Per-thread participation record.
pub(crate) struct ThreadRecord {
    // Zero outside a critical section, otherwise the control word observed
    // when the section began.
    access_control: CachePadded<AtomicU32>,
    // Live guards that joined the open section. Only the owner touches it.
    joined: AtomicUsize,
    owner: ThreadId,
    retired: AtomicBool,
    next: AtomicPtr<ThreadRecord>,
}

impl ThreadRecord {
    fn new(owner: ThreadId) -> Self {
        ThreadRecord {
            access_control: CachePadded::new(AtomicU32::new(0)),
            joined: AtomicUsize::new(0),
            owner,
            retired: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    pub(crate) fn owner(&self) -> ThreadId {
        self.owner
    }

    #[inline]
    pub(crate) fn access_control(&self) -> u32 {
        self.access_control.load(Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn is_locked(&self) -> bool {
        self.access_control.load(Ordering::Relaxed) != 0
    }

    /// Publishes `word` as this thread's critical-section marker. The fence
    /// orders the store before every later load of shared structure.
    #[inline]
    pub(crate) fn enter(&self, word: u32) {
        debug_assert_ne!(word, 0);
        self.access_control.store(word, Ordering::Relaxed);
        fence(Ordering::SeqCst);
    }

    #[inline]
    pub(crate) fn exit(&self) {
        self.access_control.store(0, Ordering::Release);
    }

    #[inline]
    pub(crate) fn join(&self) {
        debug_assert!(self.is_locked());
        self.joined.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn leave(&self) {
        let previous = self.joined.fetch_sub(1, Ordering::Relaxed);
        debug_assert_ne!(previous, 0);
    }

    #[inline]
    pub(crate) fn joined(&self) -> usize {
        self.joined.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

pub(crate) struct ThreadRegistry {
    head: AtomicPtr<ThreadRecord>,
    attached: AtomicUsize,
}

impl ThreadRegistry {
    pub(crate) fn new() -> Self {
        ThreadRegistry {
            head: AtomicPtr::new(ptr::null_mut()),
            attached: AtomicUsize::new(0),
        }
    }

    /// Links a fresh record for the calling thread at the head of the list.
    pub(crate) fn attach(&self) -> NonNull<ThreadRecord> {
        let record = Box::into_raw(Box::new(ThreadRecord::new(thread::current().id())));

        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            // The record is not published yet, nobody else can see this store.
            //
            unsafe { (*record).next.store(head, Ordering::Relaxed) };

            match self
                .head
                .compare_exchange_weak(head, record, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => head = actual,
            }
        }

        self.attached.fetch_add(1, Ordering::Relaxed);

        // SAFETY: Box::into_raw never returns null.
        unsafe { NonNull::new_unchecked(record) }
    }

    /// Retires `record`. The next scan unlinks and frees it.
    ///
    /// # Safety
    /// `record` must have been returned by [`attach`](Self::attach) on this
    /// registry and must not have been detached before. The caller must not
    /// touch the record afterwards.
    pub(crate) unsafe fn detach(&self, record: NonNull<ThreadRecord>) {
        let record = unsafe { record.as_ref() };
        record.access_control.store(0, Ordering::SeqCst);
        record.retired.store(true, Ordering::Release);
        self.attached.fetch_sub(1, Ordering::Relaxed);
    }

    /// Number of records attached and not yet detached.
    pub(crate) fn attached(&self) -> usize {
        self.attached.load(Ordering::Relaxed)
    }

    /// Visits every live record, pruning retired ones along the way.
    ///
    /// # Safety
    /// The caller must be the only thread scanning this registry.
    pub(crate) unsafe fn scan(&self, mut visit: impl FnMut(&ThreadRecord)) {
        let mut pred: &AtomicPtr<ThreadRecord> = &self.head;
        let mut curr = self.head.load(Ordering::Acquire);

        while !curr.is_null() {
            let record = unsafe { &*curr };
            let next = record.next.load(Ordering::Acquire);

            if record.is_retired() {
                // Interior links are only written by the scanner, the head is
                // shared with attaching threads.
                //
                let unlinked = if ptr::eq(pred, &self.head) {
                    self.head
                        .compare_exchange(curr, next, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                } else {
                    pred.store(next, Ordering::Release);
                    true
                };

                if unlinked {
                    drop(unsafe { Box::from_raw(curr) });
                    curr = next;
                    continue;
                }

                // A thread attached in front of us. Leave the record for the
                // next scan.
            } else {
                visit(record);
            }

            pred = &record.next;
            curr = next;
        }
    }
}

impl Drop for ThreadRegistry {
    fn drop(&mut self) {
        let mut curr = *self.head.get_mut();
        while !curr.is_null() {
            let record = unsafe { Box::from_raw(curr) };
            curr = record.next.load(Ordering::Relaxed);
        }
    }
}
