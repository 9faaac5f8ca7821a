use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::num::NonZero;
use std::time::Duration;

use crate::PoolStrategy;

/// Measured batch durations of one strategy, keyed by pool size.
///
/// Each repetition appends one sample per pool size. Samples keep their recording order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResultTable {
    samples: BTreeMap<usize, Vec<Duration>>,
}

impl ResultTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one measured duration for the given pool size.
    pub fn record(&mut self, pool_size: NonZero<usize>, duration: Duration) {
        self.samples
            .entry(pool_size.get())
            .or_default()
            .push(duration);
    }

    /// The samples recorded for a pool size, in recording order. Empty if there are none.
    #[must_use]
    pub fn samples(&self, pool_size: usize) -> &[Duration] {
        self.samples.get(&pool_size).map_or(&[], Vec::as_slice)
    }

    /// Every pool size with at least one sample, ascending.
    pub fn pool_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.samples.keys().copied()
    }

    /// The arithmetic mean of the samples of every pool size.
    #[must_use]
    pub fn averages(&self) -> BTreeMap<usize, Duration> {
        self.samples
            .iter()
            .filter_map(|(pool_size, samples)| mean(samples).map(|mean| (*pool_size, mean)))
            .collect()
    }
}

/// Truncates to whole nanoseconds. Returns `None` for an empty slice.
fn mean(samples: &[Duration]) -> Option<Duration> {
    let count = u128::try_from(samples.len()).ok()?;

    let total_nanos = samples
        .iter()
        .map(Duration::as_nanos)
        .fold(0_u128, u128::saturating_add);

    let mean_nanos = total_nanos.checked_div(count)?;

    Some(Duration::from_nanos(
        mean_nanos
            .try_into()
            .expect("mean of real measurements cannot exceed u64 nanoseconds"),
    ))
}

/// The result tables of every strategy in one benchmark run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BenchmarkResults {
    private_channels: ResultTable,
    shared_channel: ResultTable,
}

impl BenchmarkResults {
    /// Creates empty tables for every strategy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The result table of one strategy.
    #[must_use]
    pub fn table(&self, strategy: PoolStrategy) -> &ResultTable {
        match strategy {
            PoolStrategy::PrivateChannels => &self.private_channels,
            PoolStrategy::SharedChannel => &self.shared_channel,
        }
    }

    /// The result table of one strategy, for recording.
    pub fn table_mut(&mut self, strategy: PoolStrategy) -> &mut ResultTable {
        match strategy {
            PoolStrategy::PrivateChannels => &mut self.private_channels,
            PoolStrategy::SharedChannel => &mut self.shared_channel,
        }
    }

    /// Reduces the tables to per-size averages that compare the strategies.
    #[must_use]
    pub fn report(&self) -> Report {
        let private_channels = self.private_channels.averages();
        let shared_channel = self.shared_channel.averages();

        let mut pool_sizes = private_channels
            .keys()
            .chain(shared_channel.keys())
            .copied()
            .collect::<Vec<_>>();
        pool_sizes.sort_unstable();
        pool_sizes.dedup();

        // A size measured under only one strategy reports zero for the other one.
        let rows = pool_sizes
            .into_iter()
            .map(|pool_size| ReportRow {
                pool_size,
                private_channels: private_channels
                    .get(&pool_size)
                    .copied()
                    .unwrap_or_default(),
                shared_channel: shared_channel
                    .get(&pool_size)
                    .copied()
                    .unwrap_or_default(),
            })
            .collect();

        Report { rows }
    }
}

/// Average batch durations per pool size, comparing both strategies.
///
/// The `Display` output is the final report of the benchmark: for every pool size, an
/// empty line and then a comparison line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
    // Ascending by pool size.
    rows: Vec<ReportRow>,
}

impl Report {
    /// Iterates over the rows of the report in ascending pool size order.
    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f)?;
            writeln!(f, "{row}")?;
        }

        Ok(())
    }
}

/// The averaged durations of both strategies for one pool size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReportRow {
    pool_size: usize,
    private_channels: Duration,
    shared_channel: Duration,
}

impl ReportRow {
    /// The number of task units per batch.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// The average duration of one strategy for this pool size.
    #[must_use]
    pub fn average(&self, strategy: PoolStrategy) -> Duration {
        match strategy {
            PoolStrategy::PrivateChannels => self.private_channels,
            PoolStrategy::SharedChannel => self.shared_channel,
        }
    }
}

impl Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks: dispatcher={:?}, no dispatcher={:?}",
            self.pool_size, self.private_channels, self.shared_channel
        )
    }
}
