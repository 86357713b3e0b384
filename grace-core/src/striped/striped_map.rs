use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

use parking_lot::Mutex;

use crate::data_structures::UpdateOutcome;
use crate::striped::{BucketAdapter, HashedBucket};

/// Map split over a fixed number of mutex-protected buckets.
///
/// Operations on keys that hash to different stripes never contend.
pub struct StripedMap<K, V, B = HashedBucket<K, V>, S = RandomState> {
    stripes: Box<[Mutex<B>]>,
    hasher: S,
    _entries: PhantomData<fn(K, V)>,
}

impl<K, V, B> StripedMap<K, V, B>
where
    K: Hash,
    B: BucketAdapter<K, V>,
{
    pub fn new(stripe_count: usize) -> Self {
        Self::with_hasher(stripe_count, RandomState::new())
    }
}

impl<K, V, B, S> StripedMap<K, V, B, S>
where
    K: Hash,
    B: BucketAdapter<K, V>,
    S: BuildHasher,
{
    pub fn with_hasher(stripe_count: usize, hasher: S) -> Self {
        let stripes = (0..stripe_count.max(1))
            .map(|_| Mutex::new(B::default()))
            .collect();

        StripedMap {
            stripes,
            hasher,
            _entries: PhantomData,
        }
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    #[inline]
    fn stripe(&self, key: &K) -> &Mutex<B> {
        let hash = self.hasher.hash_one(key);
        &self.stripes[(hash % self.stripes.len() as u64) as usize]
    }

    pub fn insert(&self, key: K, value: V) -> bool {
        self.stripe(&key).lock().insert(key, value)
    }

    pub fn emplace<Args>(&self, key: K, args: Args) -> bool
    where
        V: From<Args>,
    {
        self.stripe(&key).lock().emplace(key, args)
    }

    pub fn update<F>(&self, key: K, f: F, allow_insert: bool) -> UpdateOutcome
    where
        V: Default,
        F: FnOnce(bool, &mut V),
    {
        self.stripe(&key).lock().update(key, f, allow_insert)
    }

    pub fn erase(&self, key: &K) -> Option<V> {
        self.stripe(key).lock().erase(key)
    }

    pub fn erase_with<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&K, &V),
    {
        self.stripe(key).lock().erase_with(key, f)
    }

    pub fn find<R, F>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.stripe(key).lock().find(key, f)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key, |_| ()).is_some()
    }

    /// Sum of the stripe sizes. Stripes are locked one at a time, so the
    /// result is approximate while writers are running.
    pub fn len(&self) -> usize {
        self.stripes.iter().map(|stripe| stripe.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stripes.iter().all(|stripe| stripe.lock().is_empty())
    }

    pub fn clear(&self) {
        for stripe in self.stripes.iter() {
            stripe.lock().clear();
        }
    }

    /// Visits every entry, one stripe at a time.
    pub fn for_each<F: FnMut(&K, &V)>(&self, mut f: F) {
        for stripe in self.stripes.iter() {
            stripe.lock().for_each(&mut f);
        }
    }
}

impl<K, V, B, S> fmt::Debug for StripedMap<K, V, B, S>
where
    K: Hash,
    B: BucketAdapter<K, V>,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripedMap")
            .field("stripes", &self.stripe_count())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::striped::OrderedBucket;

    #[test]
    fn test_basic_operations() {
        let map: StripedMap<i32, String> = StripedMap::new(4);
        assert!(map.is_empty());

        assert!(map.insert(1, "one".to_string()));
        assert!(!map.insert(1, "uno".to_string()));
        assert!(map.emplace(2, "two"));
        assert_eq!(map.len(), 2);

        assert_eq!(map.find(&1, |v| v.clone()), Some("one".to_string()));
        assert_eq!(map.erase(&1), Some("one".to_string()));
        assert!(!map.contains(&1));

        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn test_single_stripe_still_works() {
        let map: StripedMap<i32, i32, OrderedBucket<i32, i32>> = StripedMap::new(0);
        assert_eq!(map.stripe_count(), 1);
        assert!(map.insert(1, 1));
        assert_eq!(
            map.update(1, |_, v| *v += 1, false),
            UpdateOutcome::Updated
        );
        assert_eq!(map.find(&1, |v| *v), Some(2));
    }

    #[test]
    fn test_concurrent_disjoint_inserts() {
        let map: Arc<StripedMap<usize, usize>> = Arc::new(StripedMap::new(16));
        let num_threads = 4;
        let items_per_thread = 1_000;

        let handles: Vec<_> = (0..num_threads)
            .map(|id| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    for i in 0..items_per_thread {
                        let key = id * items_per_thread + i;
                        assert!(map.insert(key, key * 2));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), num_threads * items_per_thread);
        let mut total = 0;
        map.for_each(|k, v| {
            assert_eq!(*v, k * 2);
            total += 1;
        });
        assert_eq!(total, num_threads * items_per_thread);
    }
}
