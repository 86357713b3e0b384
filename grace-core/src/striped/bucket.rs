use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::data_structures::UpdateOutcome;

/// Uniform interface over a single-threaded map used as one stripe.
///
/// No method locks. The striping layer guarantees exclusive access to the
/// bucket for the duration of every call.
pub trait BucketAdapter<K, V>: Default {
    /// Inserts `key` unless present. Returns whether it was inserted.
    fn insert(&mut self, key: K, value: V) -> bool;

    /// Removes `key` and returns its entry.
    fn remove_entry(&mut self, key: &K) -> Option<(K, V)>;

    fn get(&self, key: &K) -> Option<&V>;

    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn for_each<F: FnMut(&K, &V)>(&self, f: F);

    /// Moves every entry of `self` into `other`, e.g. when re-striping.
    fn drain_into(&mut self, other: &mut Self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emplace<Args>(&mut self, key: K, args: Args) -> bool
    where
        V: From<Args>,
    {
        self.insert(key, V::from(args))
    }

    fn update<F>(&mut self, key: K, f: F, allow_insert: bool) -> UpdateOutcome
    where
        V: Default,
        F: FnOnce(bool, &mut V),
    {
        if let Some(value) = self.get_mut(&key) {
            f(false, value);
            return UpdateOutcome::Updated;
        }

        if !allow_insert {
            return UpdateOutcome::Absent;
        }

        let mut value = V::default();
        f(true, &mut value);
        self.insert(key, value);
        UpdateOutcome::Inserted
    }

    fn erase(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    fn erase_with<F>(&mut self, key: &K, f: F) -> bool
    where
        F: FnOnce(&K, &V),
    {
        match self.remove_entry(key) {
            Some((key, value)) => {
                f(&key, &value);
                true
            }
            None => false,
        }
    }

    fn find<R, F>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.get(key).map(f)
    }
}

/// Bucket over a [`BTreeMap`].
#[derive(Debug)]
pub struct OrderedBucket<K, V> {
    map: BTreeMap<K, V>,
}

impl<K, V> Default for OrderedBucket<K, V> {
    fn default() -> Self {
        OrderedBucket {
            map: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> BucketAdapter<K, V> for OrderedBucket<K, V> {
    fn insert(&mut self, key: K, value: V) -> bool {
        match self.map.entry(key) {
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.map.remove_entry(key)
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn for_each<F: FnMut(&K, &V)>(&self, mut f: F) {
        self.map.iter().for_each(|(k, v)| f(k, v));
    }

    fn drain_into(&mut self, other: &mut Self) {
        other.map.append(&mut self.map);
    }
}

/// Bucket over a [`HashMap`].
#[derive(Debug)]
pub struct HashedBucket<K, V> {
    map: HashMap<K, V>,
}

impl<K, V> Default for HashedBucket<K, V> {
    fn default() -> Self {
        HashedBucket {
            map: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq, V> BucketAdapter<K, V> for HashedBucket<K, V> {
    fn insert(&mut self, key: K, value: V) -> bool {
        match self.map.entry(key) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
            std::collections::hash_map::Entry::Occupied(_) => false,
        }
    }

    fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.map.remove_entry(key)
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn for_each<F: FnMut(&K, &V)>(&self, mut f: F) {
        self.map.iter().for_each(|(k, v)| f(k, v));
    }

    fn drain_into(&mut self, other: &mut Self) {
        other.map.extend(self.map.drain());
    }
}
