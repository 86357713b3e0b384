use std::ops::AddAssign;
use std::thread;
use std::time::{Duration, Instant};

use grace_core::striped::{BucketAdapter, OrderedBucket};
use log::{debug, warn};

use crate::error::Result;
use crate::partition::partition;
use crate::script::{Instr, Op};
use crate::table::ConcurrentTable;

/// Counters collected while replaying a script.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub inserted: usize,
    pub duplicates: usize,
    pub removed: usize,
    pub found: usize,
    /// Deletes and lookups whose key was not present.
    pub absent: usize,
    /// Deletes and lookups whose key held another value than scripted.
    pub mismatches: usize,
}

impl AddAssign for ReplayStats {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.removed += other.removed;
        self.found += other.found;
        self.absent += other.absent;
        self.mismatches += other.mismatches;
    }
}

impl ReplayStats {
    fn check(&mut self, instr: &Instr, actual: Option<i64>) {
        match actual {
            None => self.absent += 1,
            Some(value) if value == instr.value => match instr.op {
                Op::Delete => self.removed += 1,
                _ => self.found += 1,
            },
            Some(value) => {
                self.mismatches += 1;
                warn!(
                    "{:?} {} expected value {}, found {}",
                    instr.op, instr.key, instr.value, value
                );
            }
        }
    }
}

/// Final contents of the single-threaded replay.
pub type Baseline = OrderedBucket<i64, i64>;

/// Replays `instrs` in order on one thread. Absent keys count as mismatches
/// here, the script is expected to be consistent when run sequentially.
pub fn run_baseline(instrs: &[Instr]) -> (Baseline, ReplayStats, Duration) {
    let mut table = Baseline::default();
    let mut stats = ReplayStats::default();
    let started = Instant::now();

    for instr in instrs {
        match instr.op {
            Op::Insert => {
                if table.insert(instr.key, instr.value) {
                    stats.inserted += 1;
                } else {
                    stats.duplicates += 1;
                }
            }
            Op::Delete => stats.check(instr, table.erase(&instr.key)),
            Op::Lookup => stats.check(instr, table.find(&instr.key, |v| *v)),
        }
    }

    let elapsed = started.elapsed();
    stats.mismatches += stats.absent;
    debug!("baseline replay of {} instructions took {:?}", instrs.len(), elapsed);

    (table, stats, elapsed)
}

/// Replays `instrs` split over `threads` threads, each running its chunk in
/// order against the shared `table`.
pub fn run_concurrent<T>(
    table: &T,
    instrs: &[Instr],
    threads: usize,
) -> Result<(ReplayStats, Duration)>
where
    T: ConcurrentTable + ?Sized,
{
    let chunks = partition(instrs.len(), threads)?;
    let started = Instant::now();

    let per_thread: Vec<ReplayStats> = thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|range| {
                let chunk = &instrs[range];
                scope.spawn(move || replay_chunk(table, chunk))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(stats) => stats,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let elapsed = started.elapsed();
    let mut stats = ReplayStats::default();
    for partial in per_thread {
        stats += partial;
    }

    debug!(
        "{} thread replay of {} instructions took {:?}",
        threads,
        instrs.len(),
        elapsed
    );
    Ok((stats, elapsed))
}

// Absent keys are not errors: another chunk may legitimately have removed
// the key or not inserted it yet.
//
fn replay_chunk<T>(table: &T, chunk: &[Instr]) -> ReplayStats
where
    T: ConcurrentTable + ?Sized,
{
    let mut stats = ReplayStats::default();

    for instr in chunk {
        match instr.op {
            Op::Insert => {
                if table.insert(instr.key, instr.value) {
                    stats.inserted += 1;
                } else {
                    stats.duplicates += 1;
                }
            }
            Op::Delete => stats.check(instr, table.remove(instr.key)),
            Op::Lookup => stats.check(instr, table.lookup(instr.key)),
        }
    }

    stats
}

/// Entries on which a concurrent run and the baseline disagree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Baseline entries the table lacks or holds with another value.
    pub missing: Vec<(i64, i64)>,
    /// Table entries the baseline lacks or holds with another value.
    pub extra: Vec<(i64, i64)>,
}

impl Verification {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compares the final contents of `table` with `baseline` in both
/// directions.
pub fn verify<T>(baseline: &Baseline, table: &T) -> Verification
where
    T: ConcurrentTable + ?Sized,
{
    let mut verification = Verification::default();

    baseline.for_each(|key, value| {
        if table.lookup(*key) != Some(*value) {
            verification.missing.push((*key, *value));
        }
    });

    for (key, value) in table.entries() {
        if baseline.find(&key, |v| *v) != Some(value) {
            verification.extra.push((key, value));
        }
    }

    for (key, value) in &verification.missing {
        warn!("table does not contain ({}, {})", key, value);
    }
    for (key, value) in &verification.extra {
        warn!("table contains additional entry ({}, {})", key, value);
    }

    verification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse;
    use crate::table::Backend;

    #[test]
    fn test_baseline_counts() {
        let instrs = parse("I 1 10\nI 2 20\nI 1 11\nL 1 10\nL 2 99\nD 2 20\nD 3 30\n").unwrap();
        let (table, stats, _) = run_baseline(&instrs);

        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.found, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.absent, 1);
        // A wrong value and an absent key.
        assert_eq!(stats.mismatches, 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_verify_reports_both_directions() {
        let mut baseline = Baseline::default();
        baseline.insert(1, 10);
        baseline.insert(2, 20);

        let table = Backend::Striped.build(2);
        table.insert(1, 10);
        table.insert(2, 21);
        table.insert(3, 30);

        let verification = verify(&baseline, table.as_ref());
        assert_eq!(verification.missing, vec![(2, 20)]);

        let mut extra = verification.extra.clone();
        extra.sort_unstable();
        assert_eq!(extra, vec![(2, 21), (3, 30)]);
        assert!(!verification.is_consistent());
    }
}
