use std::io::Write;

use crate::{BatchScheduling, BenchConfig, BenchmarkResults, PoolStrategy, Result, launch_batch};

/// Measures every strategy at every configured pool size, `repetitions` times each.
///
/// Progress is written to `out` while the run executes: a header line per strategy and a
/// `round <k> ` fragment per repetition. The returned results hold one sample per
/// repetition for every (strategy, pool size) pair. Use [`BenchmarkResults::report()`]
/// to average them.
///
/// With [`BatchScheduling::Overlapped`], batches are only launched during the loop and
/// are collected once everything has been launched.
///
/// # Errors
///
/// Returns an error if writing progress fails or if any batch fails.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub async fn run_benchmark<W: Write>(
    config: &BenchConfig,
    out: &mut W,
) -> Result<BenchmarkResults> {
    tracing::info!(
        repetitions = config.repetitions().get(),
        max_pool_size = config.max_pool_size().get(),
        scheduling = ?config.scheduling(),
        "benchmark starting"
    );

    let mut results = BenchmarkResults::new();
    let mut pending = Vec::new();

    for strategy in PoolStrategy::ALL {
        writeln!(out)?;
        writeln!(out, "{strategy}:")?;

        for round in 1..=config.repetitions().get() {
            write!(out, "round {round} ")?;
            out.flush()?;

            for pool_size in config.pool_sizes() {
                let batch = launch_batch(strategy, pool_size);

                match config.scheduling() {
                    BatchScheduling::Sequential => {
                        let elapsed = batch.finish().await?;
                        results.table_mut(strategy).record(pool_size, elapsed);
                    }
                    BatchScheduling::Overlapped => pending.push(batch),
                }
            }
        }
    }

    tracing::debug!(outstanding = pending.len(), "all batches launched");

    for batch in pending {
        let strategy = batch.strategy();
        let pool_size = batch.size();

        let elapsed = batch.finish().await?;
        results.table_mut(strategy).record(pool_size, elapsed);
    }

    tracing::info!("benchmark finished");

    Ok(results)
}
