mod allocator;
mod comparator;
mod exempt_ptr;
pub(crate) mod internal;
mod kv_list;
mod kv_list_iter;
mod raw_ptr;
mod statistics;

pub use allocator::{GlobalNodeAllocator, NodeAllocator};
pub use comparator::{KeyComparator, NaturalOrder, OrderBy, ReverseOrder};
pub use exempt_ptr::ExemptPtr;
pub use kv_list::{KvList, UpdateOutcome};
pub use kv_list_iter::Iter;
pub use raw_ptr::RawPtr;
pub use statistics::ListStatistics;
