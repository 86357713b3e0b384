use std::fmt;
use std::time::Duration;

use crate::replay::{ReplayStats, Verification};
use crate::table::Backend;

/// Outcome of one concurrent replay.
#[derive(Debug, Clone)]
pub struct ThreadRun {
    pub threads: usize,
    pub elapsed: Duration,
    pub stats: ReplayStats,
    pub verification: Option<Verification>,
}

/// Timings of a script: the sequential baseline and one concurrent run per
/// thread count.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub script: String,
    pub backend: Backend,
    pub instructions: usize,
    pub baseline: Duration,
    pub baseline_stats: ReplayStats,
    pub runs: Vec<ThreadRun>,
}

impl RunReport {
    pub fn speedup(&self, run: &ThreadRun) -> f64 {
        let elapsed = run.elapsed.as_secs_f64();
        if elapsed == 0.0 {
            return f64::INFINITY;
        }
        self.baseline.as_secs_f64() / elapsed
    }

    /// False if any verified run disagreed with the baseline.
    pub fn is_consistent(&self) -> bool {
        self.runs
            .iter()
            .filter_map(|run| run.verification.as_ref())
            .all(Verification::is_consistent)
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "script {} ({} instructions, backend {})",
            self.script,
            self.instructions,
            self.backend.name()
        )?;
        writeln!(
            f,
            "  sequential baseline: {:>10.3} ms, {} mismatches",
            millis(self.baseline),
            self.baseline_stats.mismatches
        )?;

        for run in &self.runs {
            write!(
                f,
                "  {:>3} threads: {:>10.3} ms, speedup {:>6.2}x, {} mismatches",
                run.threads,
                millis(run.elapsed),
                self.speedup(run),
                run.stats.mismatches
            )?;
            if let Some(verification) = &run.verification {
                write!(
                    f,
                    ", {} missing, {} extra",
                    verification.missing.len(),
                    verification.extra.len()
                )?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
