use std::cell::RefCell;
use std::mem;
use std::ptr::NonNull;
use std::sync::Arc;

use log::warn;

use crate::global::Global;
use crate::registry::ThreadRecord;

// Per-thread participation in one domain. Dropping the handle detaches the
// thread's record.
//
struct LocalHandle {
    global: Arc<Global>,
    record: NonNull<ThreadRecord>,
}

impl Drop for LocalHandle {
    fn drop(&mut self) {
        let record = unsafe { self.record.as_ref() };
        if record.is_locked() {
            warn!(
                "thread {:?} left domain {} inside a read-side critical section",
                record.owner(),
                self.global.id()
            );
        }

        // SAFETY: the record came from attach() and this handle is its only owner.
        unsafe { self.global.registry().detach(self.record) };
    }
}

thread_local! {
    static HANDLES: RefCell<Vec<LocalHandle>> = const { RefCell::new(Vec::new()) };
}

/// Returns the calling thread's record in `global`, attaching on first use.
///
/// Panics while thread-local storage is being torn down.
pub(crate) fn current(global: &Arc<Global>) -> NonNull<ThreadRecord> {
    let mut stale = Vec::new();

    let record = HANDLES
        .try_with(|handles| {
            let mut handles = handles.borrow_mut();
            if let Some(handle) = handles.iter().find(|h| h.global.id() == global.id()) {
                return handle.record;
            }

            // Drop participation in domains whose last handle is gone. The
            // handles are released after the borrow ends since releasing the
            // last reference to a domain runs its leftover disposers.
            //
            let (closed, open): (Vec<_>, Vec<_>) = mem::take(&mut *handles)
                .into_iter()
                .partition(|h| h.global.is_closed());
            *handles = open;
            stale = closed;

            let record = global.registry().attach();
            handles.push(LocalHandle {
                global: Arc::clone(global),
                record,
            });
            record
        })
        .unwrap_or_else(|_| {
            panic!(
                "domain {} used after thread-local storage was destroyed",
                global.id()
            )
        });

    drop(stale);
    record
}

/// Returns the calling thread's record in `global` without attaching.
pub(crate) fn lookup(global: &Global) -> Option<NonNull<ThreadRecord>> {
    HANDLES
        .try_with(|handles| {
            handles
                .borrow()
                .iter()
                .find(|h| h.global.id() == global.id())
                .map(|h| h.record)
        })
        .ok()
        .flatten()
}

pub(crate) fn is_locked(global: &Global) -> bool {
    lookup(global).is_some_and(|record| unsafe { record.as_ref() }.is_locked())
}

/// Detaches the calling thread from `global`. Returns false if it was not
/// attached.
pub(crate) fn detach(global: &Global) -> bool {
    let removed = HANDLES
        .try_with(|handles| {
            let mut handles = handles.borrow_mut();
            handles
                .iter()
                .position(|h| h.global.id() == global.id())
                .map(|index| handles.swap_remove(index))
        })
        .ok()
        .flatten();

    match removed {
        Some(handle) => {
            drop(handle);
            true
        }
        None => false,
    }
}
