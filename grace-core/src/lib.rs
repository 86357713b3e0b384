//! Lock-free ordered key/value list reclaimed through read-copy-update.
//!
//! ```
//! use grace_core::data_structures::KvList;
//! use grace_rcu::{Buffered, Rcu};
//!
//! let rcu: Rcu<Buffered> = Rcu::new();
//! let list: KvList<u32, &str, Buffered> = KvList::new(rcu.clone());
//!
//! assert!(list.insert(5, "a"));
//! assert!(!list.insert(5, "b"));
//!
//! {
//!     let guard = rcu.read_lock();
//!     let entry = list.get(&5, &guard).unwrap();
//!     assert_eq!(*entry, "a");
//! }
//!
//! let extracted = list.extract(&5).unwrap();
//! assert!(!list.contains(&5));
//! assert_eq!(*extracted.value(), "a");
//! ```

pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod striped;

pub use data_structures::{ExemptPtr, KvList, RawPtr, UpdateOutcome};
pub use error::ListError;
