#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the fanout benchmark.
//!
//! Excluded from mutation testing because process entry and exit behavior can only be
//! observed by spawning the binary.

use std::io::{self, Write};
use std::process::ExitCode;

use argh::FromArgs;
use fanout_bench::{BatchScheduling, BenchConfig, Result, run_benchmark};
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;

/// Measures how long it takes to spawn, signal and tear down pools of lightweight tasks,
/// comparing private per-task work signals with one shared work signal.
#[derive(FromArgs)]
struct Args {
    /// how many times every batch is measured (default 10)
    #[argh(option)]
    repetitions: Option<u32>,

    /// largest pool size to measure; sizes grow 1, 10, 100, ... (default 1000000)
    #[argh(option)]
    max_pool_size: Option<usize>,

    /// finish every batch before launching the next one instead of overlapping them
    #[argh(switch)]
    sequential: bool,

    /// number of runtime worker threads (default: one per processor)
    #[argh(option)]
    worker_threads: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<BenchConfig> {
        let mut builder = BenchConfig::builder();

        if let Some(repetitions) = self.repetitions {
            builder = builder.repetitions(repetitions);
        }

        if let Some(max_pool_size) = self.max_pool_size {
            builder = builder.max_pool_size(max_pool_size);
        }

        if self.sequential {
            builder = builder.scheduling(BatchScheduling::Sequential);
        }

        if let Some(worker_threads) = self.worker_threads {
            builder = builder.worker_threads(worker_threads);
        }

        builder.build()
    }
}

#[cfg_attr(test, mutants::skip)] // Binary entry point - mutations would require subprocess testing which is impractical.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Args = argh::from_env();

    match args.into_config().and_then(|config| execute(&config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg_attr(test, mutants::skip)] // Builds a real runtime and writes to stdout, only observable by running the binary.
fn execute(config: &BenchConfig) -> Result<()> {
    let mut runtime = Builder::new_multi_thread();
    runtime.enable_all();

    if let Some(worker_threads) = config.worker_threads() {
        runtime.worker_threads(worker_threads.get());
    }

    let runtime = runtime.build()?;

    let mut stdout = io::stdout().lock();
    let results = runtime.block_on(run_benchmark(config, &mut stdout))?;

    write!(stdout, "{}", results.report())?;
    stdout.flush()?;

    Ok(())
}
