use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, warn};

use grace_workload::{Backend, RunConfig, Script, run_script};

#[derive(Parser, Debug)]
#[command(name = "grace-workload")]
#[command(about = "Replays insert/delete/lookup scripts and reports concurrent speedup", long_about = None)]
struct Args {
    /// Script files to replay
    #[arg(value_name = "SCRIPTS", required = true)]
    scripts: Vec<PathBuf>,

    /// Largest thread count, runs use 1, 2, 4, .. up to it
    #[arg(short = 't', long, default_value_t = 16)]
    max_threads: usize,

    /// Table to replay against
    #[arg(short, long, value_enum, default_value_t = Backend::Striped)]
    backend: Backend,

    /// Stripe count of the striped backend
    #[arg(short, long)]
    stripes: Option<usize>,

    /// Compare every concurrent run with the sequential baseline
    #[arg(long)]
    verify: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = RunConfig {
        backend: args.backend,
        max_threads: args.max_threads,
        stripes: args.stripes,
        verify: args.verify,
    };

    for path in &args.scripts {
        let report = match Script::load(path).and_then(|script| run_script(&script, &config)) {
            Ok(report) => report,
            Err(err) => {
                error!("{}", err);
                return ExitCode::FAILURE;
            }
        };

        println!("{}", report);
        // Multi-threaded runs interleave chunks, their contents may differ.
        if !report.is_consistent() {
            warn!("{} disagrees with the sequential baseline", report.script);
        }
    }

    ExitCode::SUCCESS
}
