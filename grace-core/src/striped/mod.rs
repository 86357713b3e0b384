//! Lock-based striping over ordinary maps.
//!
//! A [`StripedMap`] splits its keys over a fixed set of buckets, each behind
//! its own mutex. The buckets themselves are plain single-threaded maps
//! wrapped by a [`BucketAdapter`], which assumes its caller already holds
//! exclusive access.

mod bucket;
mod striped_map;

pub use bucket::{BucketAdapter, HashedBucket, OrderedBucket};
pub use striped_map::StripedMap;
