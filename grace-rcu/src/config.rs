use std::time::Duration;

use crossbeam_utils::Backoff;

/// Default number of retired pointers a domain accumulates before a
/// buffered or threaded flavor drives a grace period.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Default wake-up period of the threaded reclaimer.
pub const DEFAULT_RECLAIM_PERIOD: Duration = Duration::from_millis(10);

/// How a grace-period driver waits for a reader that is still inside a
/// critical section which began before the flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffPolicy {
    /// Busy spin with exponential backoff. Never yields the CPU.
    Spin,
    /// Spin first, then yield the time slice.
    #[default]
    Snooze,
    /// Sleep for a fixed interval between checks.
    Sleep(Duration),
}

impl BackoffPolicy {
    pub(crate) fn waiter(&self) -> Waiter {
        Waiter {
            policy: *self,
            backoff: Backoff::new(),
        }
    }
}

// One wait loop state, created per scanned record.
//
pub(crate) struct Waiter {
    policy: BackoffPolicy,
    backoff: Backoff,
}

impl Waiter {
    #[inline]
    pub(crate) fn wait(&self) {
        match self.policy {
            BackoffPolicy::Spin => self.backoff.spin(),
            BackoffPolicy::Snooze => self.backoff.snooze(),
            BackoffPolicy::Sleep(interval) => std::thread::sleep(interval),
        }
    }

    #[inline]
    pub(crate) fn is_long(&self) -> bool {
        self.backoff.is_completed()
    }
}

/// Construction-time settings of a reclamation domain.
///
/// ```
/// use std::time::Duration;
/// use grace_rcu::{BackoffPolicy, RcuConfig};
///
/// let config = RcuConfig::default()
///     .with_buffer_capacity(64)
///     .with_reclaim_period(Duration::from_millis(1))
///     .with_backoff(BackoffPolicy::Spin);
/// assert_eq!(config.buffer_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcuConfig {
    /// Queue length at which buffered and threaded flavors reclaim.
    pub buffer_capacity: usize,
    /// Period of the threaded flavor's background reclaimer.
    pub reclaim_period: Duration,
    /// Wait strategy used while a grace period waits on readers.
    pub backoff: BackoffPolicy,
}

impl RcuConfig {
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    pub fn with_reclaim_period(mut self, period: Duration) -> Self {
        self.reclaim_period = period;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for RcuConfig {
    fn default() -> Self {
        RcuConfig {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            reclaim_period: DEFAULT_RECLAIM_PERIOD,
            backoff: BackoffPolicy::default(),
        }
    }
}
