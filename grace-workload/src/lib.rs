//! Replays insert/delete/lookup scripts against a concurrent table and
//! reports the speedup over a sequential baseline.
//!
//! A script holds one instruction per line:
//!
//! ```text
//! I 42 7
//! L 42 7
//! D 42 7
//! ```

pub mod error;
pub mod hashing;
pub mod partition;
pub mod replay;
pub mod report;
pub mod script;
pub mod table;

use log::info;

pub use error::{Result, WorkloadError};
pub use report::{RunReport, ThreadRun};
pub use script::{Instr, Op, Script};
pub use table::{Backend, ConcurrentTable};

/// Harness settings for one script.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub backend: Backend,
    pub max_threads: usize,
    /// Stripe count of the striped backend. Derived from the script size
    /// when unset.
    pub stripes: Option<usize>,
    pub verify: bool,
}

impl RunConfig {
    fn stripes_for(&self, instructions: usize) -> usize {
        self.stripes.unwrap_or(instructions / 1_000).max(1)
    }
}

/// Runs the baseline and one concurrent replay per thread count, each on a
/// fresh table.
pub fn run_script(script: &Script, config: &RunConfig) -> Result<RunReport> {
    let instrs = script.instrs();
    let thread_counts = partition::thread_counts(config.max_threads)?;
    let stripes = config.stripes_for(instrs.len());

    info!(
        "testing {} with {} ({} instructions)",
        script,
        config.backend.name(),
        instrs.len()
    );

    let (baseline_table, baseline_stats, baseline) = replay::run_baseline(instrs);
    info!("sequential baseline complete in {:?}", baseline);

    let mut runs = Vec::with_capacity(thread_counts.len());
    for threads in thread_counts {
        let table = config.backend.build(stripes);
        let (stats, elapsed) = replay::run_concurrent(table.as_ref(), instrs, threads)?;
        info!("{} thread replay complete in {:?}", threads, elapsed);

        let verification = config
            .verify
            .then(|| replay::verify(&baseline_table, table.as_ref()));

        runs.push(ThreadRun {
            threads,
            elapsed,
            stats,
            verification,
        });
    }

    Ok(RunReport {
        script: script.to_string(),
        backend: config.backend,
        instructions: instrs.len(),
        baseline,
        baseline_stats,
        runs,
    })
}
