use grace_core::data_structures::KvList;
use grace_core::striped::{HashedBucket, StripedMap};
use grace_rcu::{Buffered, Flavor, Instant, Rcu, Threaded};

use crate::hashing::DigitHash;

/// The table a workload is replayed against. Every method may be called
/// from several threads at once.
pub trait ConcurrentTable: Send + Sync {
    /// Returns false if `key` was already present.
    fn insert(&self, key: i64, value: i64) -> bool;

    /// Removes `key` and returns the value it held.
    fn remove(&self, key: i64) -> Option<i64>;

    fn lookup(&self, key: i64) -> Option<i64>;

    /// Snapshot of every entry, in no particular order.
    fn entries(&self) -> Vec<(i64, i64)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type StripedTable = StripedMap<i64, i64, HashedBucket<i64, i64>, DigitHash>;

impl ConcurrentTable for StripedTable {
    fn insert(&self, key: i64, value: i64) -> bool {
        StripedMap::insert(self, key, value)
    }

    fn remove(&self, key: i64) -> Option<i64> {
        self.erase(&key)
    }

    fn lookup(&self, key: i64) -> Option<i64> {
        self.find(&key, |value| *value)
    }

    fn entries(&self) -> Vec<(i64, i64)> {
        let mut entries = Vec::with_capacity(StripedMap::len(self));
        self.for_each(|key, value| entries.push((*key, *value)));
        entries
    }

    fn len(&self) -> usize {
        StripedMap::len(self)
    }
}

impl<F: Flavor> ConcurrentTable for KvList<i64, i64, F> {
    fn insert(&self, key: i64, value: i64) -> bool {
        KvList::insert(self, key, value)
    }

    fn remove(&self, key: i64) -> Option<i64> {
        let mut removed = None;
        self.erase_with(&key, |_, value| removed = Some(*value));
        removed
    }

    fn lookup(&self, key: i64) -> Option<i64> {
        self.find_map(&key, |_, value| *value)
    }

    fn entries(&self) -> Vec<(i64, i64)> {
        let guard = self.rcu().read_lock();
        self.iter(&guard).map(|(key, value)| (*key, *value)).collect()
    }

    fn len(&self) -> usize {
        self.size()
    }
}

/// Which table the harness drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Mutex-striped hash buckets
    Striped,
    /// Lock-free list, reclaiming on every removal
    ListInstant,
    /// Lock-free list, reclaiming in batches
    ListBuffered,
    /// Lock-free list, reclaiming on a background thread
    ListThreaded,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Striped => "striped",
            Backend::ListInstant => "list-instant",
            Backend::ListBuffered => "list-buffered",
            Backend::ListThreaded => "list-threaded",
        }
    }

    /// A fresh, empty table. Each list gets a private reclamation domain.
    pub fn build(self, stripes: usize) -> Box<dyn ConcurrentTable> {
        match self {
            Backend::Striped => Box::new(StripedTable::with_hasher(stripes, DigitHash)),
            Backend::ListInstant => Box::new(KvList::<i64, i64, Instant>::new(Rcu::new())),
            Backend::ListBuffered => Box::new(KvList::<i64, i64, Buffered>::new(Rcu::new())),
            Backend::ListThreaded => Box::new(KvList::<i64, i64, Threaded>::new(Rcu::new())),
        }
    }
}
