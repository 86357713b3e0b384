use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use crossbeam_utils::sync::{Parker, Unparker};
use log::{debug, error};

use crate::global::Global;
use crate::rcu::Rcu;

mod sealed {
    pub trait Sealed {}
}

/// Reclamation profile of a domain.
///
/// Every flavor exposes the same read-side and retire contract through
/// [`Rcu`]. They differ only in when a grace period is driven after a
/// pointer is retired.
pub trait Flavor: sealed::Sealed + Sized + Send + Sync + 'static {
    /// Short name used in logs and benchmark ids.
    const NAME: &'static str;

    #[doc(hidden)]
    fn start(global: &Arc<Global>) -> Self;

    #[doc(hidden)]
    fn on_retire(&self, global: &Global, queued: usize);

    #[doc(hidden)]
    fn shutdown(&mut self) {}

    /// The process-wide domain of this flavor, created on first use.
    fn shared() -> Rcu<Self>;
}

/// Drives a grace period on the retiring thread for every retired pointer.
///
/// Highest reclamation promptness, highest writer latency.
#[derive(Debug)]
pub struct Instant;

impl sealed::Sealed for Instant {}

impl Flavor for Instant {
    const NAME: &'static str = "instant";

    fn start(_: &Arc<Global>) -> Self {
        Instant
    }

    fn on_retire(&self, global: &Global, _: usize) {
        global.synchronize();
    }

    fn shared() -> Rcu<Self> {
        static SHARED: OnceLock<Rcu<Instant>> = OnceLock::new();
        SHARED.get_or_init(Rcu::new).clone()
    }
}

/// Batches retired pointers and drives a grace period on the retiring thread
/// once the batch reaches the configured capacity.
#[derive(Debug)]
pub struct Buffered;

impl sealed::Sealed for Buffered {}

impl Flavor for Buffered {
    const NAME: &'static str = "buffered";

    fn start(_: &Arc<Global>) -> Self {
        Buffered
    }

    fn on_retire(&self, global: &Global, queued: usize) {
        if queued >= global.config().buffer_capacity {
            global.synchronize();
        }
    }

    fn shared() -> Rcu<Self> {
        static SHARED: OnceLock<Rcu<Buffered>> = OnceLock::new();
        SHARED.get_or_init(Rcu::new).clone()
    }
}

/// Hands grace periods to a background reclaimer thread. Retiring never
/// waits for readers.
///
/// The reclaimer wakes up every `reclaim_period`, or as soon as the queue
/// reaches the configured capacity.
pub struct Threaded {
    unparker: Unparker,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl sealed::Sealed for Threaded {}

impl Threaded {
    fn reclaim_loop(global: Arc<Global>, parker: Parker, stop: Arc<AtomicBool>) {
        debug!("domain {}: reclaimer started", global.id());

        let period = global.config().reclaim_period;
        while !stop.load(Ordering::Acquire) {
            parker.park_timeout(period);
            if global.queued() > 0 {
                global.synchronize();
            }
        }

        debug!("domain {}: reclaimer stopped", global.id());
    }
}

impl Flavor for Threaded {
    const NAME: &'static str = "threaded";

    fn start(global: &Arc<Global>) -> Self {
        let parker = Parker::new();
        let unparker = parker.unparker().clone();
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let global = Arc::clone(global);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(format!("grace-reclaimer-{}", global.id()))
                .spawn(move || Threaded::reclaim_loop(global, parker, stop))
        };

        // Without a reclaimer the flavor reclaims on the retiring thread
        // like the buffered one.
        //
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(
                    "domain {}: failed to spawn reclaimer thread: {}",
                    global.id(),
                    err
                );
                None
            }
        };

        Threaded {
            unparker,
            stop,
            worker,
        }
    }

    fn on_retire(&self, global: &Global, queued: usize) {
        if queued < global.config().buffer_capacity {
            return;
        }

        if self.worker.is_some() {
            self.unparker.unpark();
        } else {
            global.synchronize();
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.unparker.unpark();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("reclaimer thread panicked");
            }
        }
    }

    fn shared() -> Rcu<Self> {
        static SHARED: OnceLock<Rcu<Threaded>> = OnceLock::new();
        SHARED.get_or_init(Rcu::new).clone()
    }
}

impl std::fmt::Debug for Threaded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Threaded")
            .field("running", &self.worker.is_some())
            .finish()
    }
}
