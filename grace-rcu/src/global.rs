use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering, fence};
use std::time::Instant;

use crossbeam_utils::CachePadded;
use log::{debug, trace};
use parking_lot::Mutex;

use crate::config::RcuConfig;
use crate::local;
use crate::registry::ThreadRegistry;
use crate::retired::{Disposal, RetireQueue, RetiredPtr};

static NEXT_DOMAIN_ID: AtomicUsize = AtomicUsize::new(1);

/// Snapshot of a domain's reclamation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RcuStatistics {
    /// Grace periods driven so far.
    pub grace_periods: u64,
    /// Pointers handed to the domain for deferred destruction.
    pub retired: u64,
    /// Retired pointers already destroyed.
    pub disposed: u64,
    /// Pointers currently waiting for a grace period.
    pub queued: usize,
    /// Threads currently attached to the domain.
    pub attached_threads: usize,
    /// Current value of the control word.
    pub control_word: u32,
}

#[derive(Default)]
struct Counters {
    grace_periods: AtomicU64,
    retired: AtomicU64,
    disposed: AtomicU64,
}

/// State shared by every handle of one reclamation domain: the control word,
/// the thread registry and the retire queue.
pub struct Global {
    id: usize,
    control: CachePadded<AtomicU32>,
    registry: ThreadRegistry,
    retired: RetireQueue,
    // Serializes grace-period drivers. Readers never take it.
    driver: Mutex<()>,
    config: RcuConfig,
    closed: AtomicBool,
    counters: Counters,
}

impl Global {
    pub(crate) fn new(config: RcuConfig) -> Self {
        Global {
            id: NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed),
            control: CachePadded::new(AtomicU32::new(1)),
            registry: ThreadRegistry::new(),
            retired: RetireQueue::new(),
            driver: Mutex::new(()),
            config,
            closed: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn config(&self) -> &RcuConfig {
        &self.config
    }

    pub(crate) fn registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    #[inline]
    pub(crate) fn control_word(&self) -> u32 {
        self.control.load(Ordering::Acquire)
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Queues `disposal` and returns the resulting queue length.
    pub(crate) fn retire(&self, disposal: Disposal) -> usize {
        self.counters.retired.fetch_add(1, Ordering::Relaxed);
        self.retired
            .push(RetiredPtr::new(disposal, self.control_word()))
    }

    pub(crate) fn queued(&self) -> usize {
        self.retired.len()
    }

    /// Drives one grace period and destroys everything retired before it
    /// started.
    ///
    /// Panics if the calling thread is inside a critical section of this
    /// domain, the wait would never finish.
    pub(crate) fn synchronize(&self) {
        assert!(
            !local::is_locked(self),
            "grace period requested inside a read-side critical section"
        );

        let _driver = self.driver.lock();
        let started = Instant::now();

        // Only pointers queued before the flip are covered by it.
        //
        let batch = self.retired.take();
        let queued = batch.len();
        if let Some(generation) = batch.newest_generation() {
            trace!(
                "domain {}: reclaiming {} pointers up to generation {}",
                self.id, queued, generation
            );
        }

        let word = self.flip_and_wait();
        let disposed = batch.dispose();

        self.counters.grace_periods.fetch_add(1, Ordering::Relaxed);
        self.counters
            .disposed
            .fetch_add(disposed as u64, Ordering::Relaxed);

        debug!(
            "domain {}: grace period {} completed in {:?}, {} pointers disposed",
            self.id,
            word,
            started.elapsed(),
            disposed
        );
    }

    // Advances the control word and waits until no attached thread is still
    // inside a critical section that began before the advance. Must be
    // called with the driver lock held.
    //
    fn flip_and_wait(&self) -> u32 {
        let previous = self.control.load(Ordering::Relaxed);
        let word = match previous.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        self.control.store(word, Ordering::SeqCst);

        // Pairs with the fence in ThreadRecord::enter. Every reader that this
        // scan sees with a zero flag will observe the unlinks made before the
        // flip.
        //
        fence(Ordering::SeqCst);

        let backoff = self.config.backoff;

        // SAFETY: the driver lock makes this the only scanner.
        unsafe {
            self.registry.scan(|record| {
                let waiter = backoff.waiter();
                loop {
                    let observed = record.access_control();
                    if observed == 0 || observed == word || record.is_retired() {
                        break;
                    }
                    if waiter.is_long() {
                        trace!(
                            "domain {}: waiting on reader {:?} at generation {}",
                            self.id,
                            record.owner(),
                            observed
                        );
                    }
                    waiter.wait();
                }
            });
        }

        word
    }

    pub(crate) fn statistics(&self) -> RcuStatistics {
        RcuStatistics {
            grace_periods: self.counters.grace_periods.load(Ordering::Relaxed),
            retired: self.counters.retired.load(Ordering::Relaxed),
            disposed: self.counters.disposed.load(Ordering::Relaxed),
            queued: self.retired.len(),
            attached_threads: self.registry.attached(),
            control_word: self.control_word(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_control_word_starts_at_one() {
        let global = Global::new(RcuConfig::default());
        assert_eq!(global.control_word(), 1);
    }

    #[test]
    fn test_synchronize_advances_control_word() {
        let global = Global::new(RcuConfig::default());
        global.synchronize();
        global.synchronize();
        assert_eq!(global.control_word(), 3);
        assert_eq!(global.statistics().grace_periods, 2);
    }

    #[test]
    fn test_control_word_skips_zero() {
        let global = Global::new(RcuConfig::default());
        global.control.store(u32::MAX, Ordering::Relaxed);
        global.synchronize();
        assert_eq!(global.control_word(), 1);
    }

    #[test]
    fn test_synchronize_disposes_queued() {
        let global = Global::new(RcuConfig::default());
        let disposed = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let disposed = Arc::clone(&disposed);
            global.retire(Disposal::Deferred(Box::new(move || {
                disposed.fetch_add(1, Ordering::SeqCst);
            })));
        }
        assert_eq!(global.queued(), 3);

        global.synchronize();
        assert_eq!(disposed.load(Ordering::SeqCst), 3);

        let stats = global.statistics();
        assert_eq!(stats.retired, 3);
        assert_eq!(stats.disposed, 3);
        assert_eq!(stats.queued, 0);
    }
}
