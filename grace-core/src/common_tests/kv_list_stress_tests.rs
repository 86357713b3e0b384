use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use grace_rcu::{Flavor, Rcu};

use crate::data_structures::KvList;

/// Writers insert, erase and update random keys while readers keep checking
/// that every traversal they make is strictly sorted.
pub fn test_mixed_operations_stay_sorted<F: Flavor>(rcu: Rcu<F>) {
    let list: Arc<KvList<u32, u64, F>> = Arc::new(KvList::new(rcu));
    let num_writers = 4;
    let num_readers = 2;
    let ops_per_writer = 2_000;
    let key_range = 256;

    for key in (0..key_range).step_by(2) {
        list.insert(key, u64::from(key));
    }

    let stop = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(num_writers + num_readers));

    let readers: Vec<_> = (0..num_readers)
        .map(|_| {
            let list = Arc::clone(&list);
            let stop = Arc::clone(&stop);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut passes = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let guard = list.rcu().read_lock();
                    let mut previous: Option<u32> = None;
                    for (key, value) in list.iter(&guard) {
                        if let Some(prev) = previous {
                            assert!(prev < *key, "order broken: {} before {}", prev, key);
                        }
                        assert_eq!(*value % 1_000, u64::from(*key) % 1_000);
                        previous = Some(*key);
                    }
                    passes += 1;
                }
                passes
            })
        })
        .collect();

    let writers: Vec<_> = (0..num_writers)
        .map(|_| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..ops_per_writer {
                    let key = fastrand::u32(0..key_range);
                    match fastrand::u8(0..4) {
                        0 => {
                            list.insert(key, u64::from(key));
                        }
                        1 => {
                            list.erase(&key);
                        }
                        2 => {
                            // Keeps value % 1000 == key % 1000.
                            list.update(key, |_, _| {}, false);
                        }
                        3 => {
                            list.contains(&key);
                        }
                        _ => unreachable!(),
                    }
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }

    let guard = list.rcu().read_lock();
    let remaining = list.iter(&guard).count();
    assert_eq!(remaining, list.size());
}

/// Threads hammer the same keys with insert and erase rounds. Every insert
/// must be matched by at most one successful erase.
pub fn test_insert_erase_churn<F: Flavor>(rcu: Rcu<F>) {
    let list: Arc<KvList<usize, usize, F>> = Arc::new(KvList::new(rcu));
    let num_threads = 8;
    let keys = 64;
    let rounds = 20;
    let inserted = Arc::new(AtomicUsize::new(0));
    let erased = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let list = Arc::clone(&list);
            let inserted = Arc::clone(&inserted);
            let erased = Arc::clone(&erased);
            thread::spawn(move || {
                for _ in 0..rounds {
                    for key in 0..keys {
                        if list.insert(key, key) {
                            inserted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    for key in 0..keys {
                        if list.erase(&key) {
                            erased.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let inserted = inserted.load(Ordering::Relaxed);
    let erased = erased.load(Ordering::Relaxed);
    assert_eq!(inserted - erased, list.size());

    let guard = list.rcu().read_lock();
    assert_eq!(list.iter(&guard).count(), list.size());
}

/// Every key is extracted by exactly one of the racing threads.
pub fn test_extract_has_single_winner<F: Flavor>(rcu: Rcu<F>) {
    let list: Arc<KvList<usize, usize, F>> = Arc::new(KvList::new(rcu));
    let num_threads = 6;
    let keys = 500;

    for key in 0..keys {
        list.insert(key, key + 1);
    }

    let barrier = Arc::new(Barrier::new(num_threads));
    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut won = Vec::new();
                for key in 0..keys {
                    if let Some(entry) = list.extract(&key) {
                        assert_eq!(*entry.value(), key + 1);
                        won.push(*entry.key());
                    }
                }
                won
            })
        })
        .collect();

    let mut all: Vec<usize> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();

    assert_eq!(all, (0..keys).collect::<Vec<_>>());
    assert!(list.empty());
    assert_eq!(list.size(), 0);
}

/// Each writer owns the keys congruent to its id and records its own
/// successful inserts and removals. Owned keys interleave along the chain, so
/// neighbouring links are contended while every key has a single writer. The
/// final contents must equal the union of the writers' records.
pub fn test_disjoint_writers_match_model<F: Flavor>(rcu: Rcu<F>) {
    let list: Arc<KvList<u32, u64, F>> = Arc::new(KvList::new(rcu));
    let num_writers: u32 = 4;
    let ops_per_writer = 3_000;
    let keys_per_writer: u32 = 64;

    let barrier = Arc::new(Barrier::new(num_writers as usize));

    let writers: Vec<_> = (0..num_writers)
        .map(|id| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut model = BTreeMap::new();
                barrier.wait();

                for _ in 0..ops_per_writer {
                    let key = fastrand::u32(0..keys_per_writer) * num_writers + id;
                    match fastrand::u8(0..4) {
                        0 | 1 => {
                            let value = fastrand::u64(..);
                            if list.insert(key, value) {
                                assert!(model.insert(key, value).is_none(), "{} inserted twice", key);
                            } else {
                                assert!(model.contains_key(&key), "{} rejected but absent", key);
                            }
                        }
                        2 => {
                            let mut erased = None;
                            if list.erase_with(&key, |_, v| erased = Some(*v)) {
                                assert_eq!(model.remove(&key), erased);
                            } else {
                                assert!(!model.contains_key(&key), "{} present but not erased", key);
                            }
                        }
                        _ => match list.extract(&key) {
                            Some(extracted) => assert_eq!(model.remove(&key), Some(*extracted)),
                            None => assert!(!model.contains_key(&key)),
                        },
                    }
                }
                model
            })
        })
        .collect();

    let mut expected = BTreeMap::new();
    for handle in writers {
        expected.extend(handle.join().unwrap());
    }

    let guard = list.rcu().read_lock();
    let actual: BTreeMap<u32, u64> = list.iter(&guard).map(|(k, v)| (*k, *v)).collect();
    let ordered: Vec<u32> = list.iter(&guard).map(|(k, _)| *k).collect();
    drop(guard);

    assert!(ordered.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(ordered.len(), actual.len());
    assert_eq!(actual, expected);
    assert_eq!(list.size(), expected.len());
}
