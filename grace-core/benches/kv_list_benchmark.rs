//! Benchmark comparing the reclamation flavors of KvList against
//! crossbeam-skiplist.
//!
//! Run with: cargo bench --package grace-core --bench kv_list_benchmark

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use crossbeam_skiplist::SkipMap;
use mimalloc::MiMalloc;
use std::sync::Arc;
use std::thread;

use grace_core::data_structures::KvList;
use grace_rcu::{Buffered, Flavor, Instant, Rcu, Threaded};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// The list is linear, keep the key space small.
const OPS_PER_THREAD: usize = 2_000;
const KEY_RANGE: u64 = 512;

const THREAD_COUNTS: [usize; 4] = [1, 2, 4, 8];

// ============================================================================
// Generic helpers for KvList
// ============================================================================

/// Disjoint key ranges per thread, insert only
fn bench_list_insert<F: Flavor>(thread_count: usize, ops_per_thread: usize) {
    let list: Arc<KvList<u64, u64, F>> = Arc::new(KvList::new(Rcu::new()));
    let mut handles = vec![];

    for t in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            for i in 0..ops_per_thread as u64 {
                // Interleaved so that threads do not append to one tail.
                let key = i * thread_count as u64 + t as u64;
                list_clone.insert(key % (KEY_RANGE * 4), i);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

/// 50% lookups, 25% inserts, 25% erases over a shared key range
fn bench_list_mixed<F: Flavor>(thread_count: usize, ops_per_thread: usize) {
    let list: Arc<KvList<u64, u64, F>> = Arc::new(KvList::new(Rcu::new()));
    for key in (0..KEY_RANGE).step_by(2) {
        list.insert(key, key);
    }

    let mut handles = vec![];

    for _ in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            for _ in 0..ops_per_thread {
                let key = fastrand::u64(0..KEY_RANGE);
                match fastrand::u8(0..4) {
                    0 => {
                        list_clone.insert(key, key);
                    }
                    1 => {
                        list_clone.erase(&key);
                    }
                    _ => {
                        black_box(list_clone.contains(&key));
                    }
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Every thread updates the same few keys
fn bench_list_contention<F: Flavor>(thread_count: usize, ops_per_thread: usize) {
    let list: Arc<KvList<u64, u64, F>> = Arc::new(KvList::new(Rcu::new()));
    let key_range = 64u64;
    let mut handles = vec![];

    for _ in 0..thread_count {
        let list_clone = Arc::clone(&list);
        let handle = thread::spawn(move || {
            for i in 0..ops_per_thread {
                let key = (i as u64) % key_range;
                if i % 2 == 0 {
                    list_clone.insert(key, key);
                } else {
                    list_clone.erase(&key);
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// crossbeam-skiplist baselines
// ============================================================================

fn bench_crossbeam_insert(thread_count: usize, ops_per_thread: usize) {
    let map: Arc<SkipMap<u64, u64>> = Arc::new(SkipMap::new());
    let mut handles = vec![];

    for t in 0..thread_count {
        let map_clone = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for i in 0..ops_per_thread as u64 {
                let key = i * thread_count as u64 + t as u64;
                map_clone.insert(key % (KEY_RANGE * 4), i);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn bench_crossbeam_mixed(thread_count: usize, ops_per_thread: usize) {
    let map: Arc<SkipMap<u64, u64>> = Arc::new(SkipMap::new());
    for key in (0..KEY_RANGE).step_by(2) {
        map.insert(key, key);
    }

    let mut handles = vec![];

    for _ in 0..thread_count {
        let map_clone = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for _ in 0..ops_per_thread {
                let key = fastrand::u64(0..KEY_RANGE);
                match fastrand::u8(0..4) {
                    0 => {
                        map_clone.get_or_insert(key, key);
                    }
                    1 => {
                        map_clone.remove(&key);
                    }
                    _ => {
                        black_box(map_clone.contains_key(&key));
                    }
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn bench_crossbeam_contention(thread_count: usize, ops_per_thread: usize) {
    let map: Arc<SkipMap<u64, u64>> = Arc::new(SkipMap::new());
    let key_range = 64u64;
    let mut handles = vec![];

    for _ in 0..thread_count {
        let map_clone = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for i in 0..ops_per_thread {
                let key = (i as u64) % key_range;
                if i % 2 == 0 {
                    map_clone.get_or_insert(key, key);
                } else {
                    map_clone.remove(&key);
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// Criterion benchmark groups
// ============================================================================

fn insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_benchmark_kv_list");
    for threads in THREAD_COUNTS {
        group.bench_with_input(
            BenchmarkId::new("insert_benchmark_instant", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_list_insert::<Instant>(black_box(threads), OPS_PER_THREAD))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("insert_benchmark_buffered", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_list_insert::<Buffered>(black_box(threads), OPS_PER_THREAD))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("insert_benchmark_threaded", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_list_insert::<Threaded>(black_box(threads), OPS_PER_THREAD))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("insert_benchmark_crossbeam", threads),
            &threads,
            |b, &threads| b.iter(|| bench_crossbeam_insert(black_box(threads), OPS_PER_THREAD)),
        );
    }
    group.finish();
}

fn mixed_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_benchmark_kv_list");
    for threads in THREAD_COUNTS {
        group.bench_with_input(
            BenchmarkId::new("mixed_benchmark_instant", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_list_mixed::<Instant>(black_box(threads), OPS_PER_THREAD))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("mixed_benchmark_buffered", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_list_mixed::<Buffered>(black_box(threads), OPS_PER_THREAD))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("mixed_benchmark_threaded", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_list_mixed::<Threaded>(black_box(threads), OPS_PER_THREAD))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("mixed_benchmark_crossbeam", threads),
            &threads,
            |b, &threads| b.iter(|| bench_crossbeam_mixed(black_box(threads), OPS_PER_THREAD)),
        );
    }
    group.finish();
}

fn contention_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention_benchmark_kv_list");
    for threads in THREAD_COUNTS {
        group.bench_with_input(
            BenchmarkId::new("contention_benchmark_buffered", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_list_contention::<Buffered>(black_box(threads), OPS_PER_THREAD))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("contention_benchmark_threaded", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_list_contention::<Threaded>(black_box(threads), OPS_PER_THREAD))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("contention_benchmark_crossbeam", threads),
            &threads,
            |b, &threads| {
                b.iter(|| bench_crossbeam_contention(black_box(threads), OPS_PER_THREAD))
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    insert_benchmark,
    mixed_benchmark,
    contention_benchmark
);
criterion_main!(benches);
