//! Read-copy-update reclamation domains.
//!
//! Readers bracket their traversal of a shared structure with a read-side
//! critical section. Writers unlink nodes and [`retire`](Rcu::retire) them.
//! A retired node is destroyed only after a grace period: every critical
//! section that was open when it was retired has closed.
//!
//! Each domain keeps a control word, a registry of participating threads and
//! a queue of retired pointers. Entering a critical section stores the
//! current control word in the thread's record. A grace period advances the
//! word and waits for every record that still shows an older value.
//!
//! Three flavors decide when grace periods run:
//!
//! - [`Instant`] reclaims on the retiring thread, right away.
//! - [`Buffered`] reclaims on the retiring thread once enough pointers piled up.
//! - [`Threaded`] reclaims on a background thread.
//!
//! ```
//! use grace_rcu::{Buffered, Rcu};
//!
//! let rcu: Rcu<Buffered> = Rcu::new();
//! {
//!     let _guard = rcu.read_lock();
//!     // read shared nodes
//! }
//! rcu.defer(|| println!("reclaimed"));
//! rcu.synchronize();
//! ```

mod config;
mod flavor;
mod global;
mod local;
mod rcu;
mod registry;
mod retired;

pub use config::{BackoffPolicy, DEFAULT_BUFFER_CAPACITY, DEFAULT_RECLAIM_PERIOD, RcuConfig};
pub use flavor::{Buffered, Flavor, Instant, Threaded};
pub use global::RcuStatistics;
pub use rcu::{Rcu, RcuGuard};
