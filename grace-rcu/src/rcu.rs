use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, warn};

use crate::config::RcuConfig;
use crate::flavor::{Buffered, Flavor};
use crate::global::{Global, RcuStatistics};
use crate::local;
use crate::retired::Disposal;

struct Domain<F: Flavor> {
    global: Arc<Global>,
    flavor: F,
}

impl<F: Flavor> Drop for Domain<F> {
    fn drop(&mut self) {
        self.flavor.shutdown();

        if local::is_locked(&self.global) {
            warn!(
                "domain {} dropped inside a read-side critical section, leftovers are disposed later",
                self.global.id()
            );
        } else {
            self.global.synchronize();
        }

        self.global.close();
    }
}

/// Handle onto one read-copy-update reclamation domain.
///
/// Clones share the same control word, thread registry and retire queue.
/// Structures that must reclaim through the same grace periods hold clones
/// of the same handle. The flavor is fixed by the type parameter.
///
/// ```
/// use grace_rcu::{Instant, Rcu};
///
/// let rcu: Rcu<Instant> = Rcu::new();
/// let value = Box::into_raw(Box::new(7));
///
/// {
///     let _guard = rcu.read_lock();
///     assert!(rcu.is_locked());
///     assert_eq!(unsafe { *value }, 7);
/// }
///
/// unsafe fn free(ptr: *mut i32) {
///     drop(unsafe { Box::from_raw(ptr) });
/// }
/// unsafe { rcu.retire(value, free) };
/// ```
pub struct Rcu<F: Flavor = Buffered> {
    domain: Arc<Domain<F>>,
}

impl<F: Flavor> Rcu<F> {
    /// Creates a new domain with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RcuConfig::default())
    }

    pub fn with_config(config: RcuConfig) -> Self {
        let global = Arc::new(Global::new(config));
        let flavor = F::start(&global);
        Rcu {
            domain: Arc::new(Domain { global, flavor }),
        }
    }

    /// The process-wide domain of flavor `F`.
    pub fn shared() -> Self {
        F::shared()
    }

    #[inline]
    fn global(&self) -> &Arc<Global> {
        &self.domain.global
    }

    pub fn config(&self) -> &RcuConfig {
        self.global().config()
    }

    /// Whether both handles refer to the same domain.
    pub fn same_domain(&self, other: &Rcu<F>) -> bool {
        Arc::ptr_eq(&self.domain, &other.domain)
    }

    /// Registers the calling thread. Optional, the first critical section
    /// registers implicitly.
    pub fn attach_current_thread(&self) {
        local::current(self.global());
    }

    /// Removes the calling thread from the registry. Grace periods stop
    /// waiting on it. Returns false if the thread was not attached.
    ///
    /// Panics inside a critical section.
    pub fn detach_current_thread(&self) -> bool {
        assert!(
            !self.is_locked(),
            "detach inside a read-side critical section"
        );
        local::detach(self.global())
    }

    /// Begins a read-side critical section on the calling thread.
    ///
    /// Panics if the thread already holds one, sections do not nest.
    pub fn access_lock(&self) {
        let global = self.global();
        let record = unsafe { local::current(global).as_ref() };
        assert!(
            !record.is_locked(),
            "nested read-side critical section in domain {}",
            global.id()
        );
        record.enter(global.control_word());
    }

    /// Ends the critical section begun by [`access_lock`](Self::access_lock).
    ///
    /// Panics if the calling thread holds none, or while a guard that joined
    /// the section is still alive.
    pub fn access_unlock(&self) {
        let global = self.global();
        let record = local::lookup(global)
            .map(|record| unsafe { record.as_ref() })
            .filter(|record| record.is_locked());

        match record {
            Some(record) => {
                assert_eq!(
                    record.joined(),
                    0,
                    "access_unlock while joined guards of domain {} are alive",
                    global.id()
                );
                record.exit();
            }
            None => panic!(
                "access_unlock without a matching access_lock in domain {}",
                global.id()
            ),
        }
    }

    /// Whether the calling thread is inside a critical section of this domain.
    pub fn is_locked(&self) -> bool {
        local::is_locked(self.global())
    }

    /// Opens a scoped critical section. If the calling thread is already
    /// inside one the guard joins it and leaves it open on drop. The outer
    /// section cannot be closed while a joined guard is alive.
    pub fn read_lock(&self) -> RcuGuard<'_, F> {
        let joined = local::lookup(self.global())
            .map(|record| unsafe { record.as_ref() })
            .filter(|record| record.is_locked());

        let owned = match joined {
            Some(record) => {
                record.join();
                false
            }
            None => {
                self.access_lock();
                true
            }
        };
        RcuGuard {
            rcu: self,
            owned,
            _unsend: PhantomData,
        }
    }

    /// Queues `ptr` for destruction by `disposer` after a grace period.
    ///
    /// Depending on the flavor this may drive the grace period immediately.
    /// Inside a critical section the pointer is only queued, the next grace
    /// period driven outside of one destroys it.
    ///
    /// # Safety
    /// `ptr` must already be unreachable for readers that start from now on,
    /// and `disposer` must be sound to call once with `ptr` from any thread.
    pub unsafe fn retire<T>(&self, ptr: *mut T, disposer: unsafe fn(*mut T)) {
        let disposal = unsafe { Disposal::from_raw(ptr, disposer) };
        self.push(disposal);
    }

    /// Runs `action` after a grace period.
    pub fn defer<D>(&self, action: D)
    where
        D: FnOnce() + Send + 'static,
    {
        self.push(Disposal::Deferred(Box::new(action)));
    }

    fn push(&self, disposal: Disposal) {
        let global = self.global();
        let queued = global.retire(disposal);

        // A grace period driven from here would wait on our own section.
        if local::is_locked(global) {
            debug!(
                "domain {} queued a retirement inside a read-side critical section ({} queued)",
                global.id(),
                queued
            );
            return;
        }
        self.domain.flavor.on_retire(global, queued);
    }

    /// Drives one grace period on the calling thread and destroys everything
    /// retired before it.
    ///
    /// Panics inside a critical section.
    pub fn synchronize(&self) {
        self.global().synchronize();
    }

    pub fn statistics(&self) -> RcuStatistics {
        self.global().statistics()
    }
}

impl<F: Flavor> Default for Rcu<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Flavor> Clone for Rcu<F> {
    fn clone(&self) -> Self {
        Rcu {
            domain: Arc::clone(&self.domain),
        }
    }
}

impl<F: Flavor> fmt::Debug for Rcu<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rcu")
            .field("flavor", &F::NAME)
            .field("domain", &self.global().id())
            .field("control_word", &self.global().control_word())
            .finish()
    }
}

/// Scoped read-side critical section returned by [`Rcu::read_lock`].
///
/// References obtained from a structure under the guard borrow it, so they
/// cannot outlive the section.
#[must_use = "the critical section ends when the guard is dropped"]
pub struct RcuGuard<'a, F: Flavor> {
    rcu: &'a Rcu<F>,
    owned: bool,
    // Critical sections belong to a thread.
    _unsend: PhantomData<*const ()>,
}

impl<F: Flavor> RcuGuard<'_, F> {
    pub fn rcu(&self) -> &Rcu<F> {
        self.rcu
    }

    /// Whether dropping this guard ends the critical section.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Whether the guard protects reads of structures reclaimed by `rcu`.
    pub fn protects(&self, rcu: &Rcu<F>) -> bool {
        self.rcu.same_domain(rcu)
    }
}

impl<F: Flavor> Drop for RcuGuard<'_, F> {
    fn drop(&mut self) {
        if self.owned {
            self.rcu.access_unlock();
        } else if let Some(record) = local::lookup(self.rcu.global()) {
            unsafe { record.as_ref() }.leave();
        }
    }
}

impl<F: Flavor> fmt::Debug for RcuGuard<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RcuGuard")
            .field("rcu", self.rcu)
            .field("owned", &self.owned)
            .finish()
    }
}
