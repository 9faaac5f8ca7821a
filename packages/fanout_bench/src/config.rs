use std::iter;
use std::num::NonZero;

use new_zealand::nz;

use crate::{Error, Result};

/// Whether a benchmark run waits for each batch before starting the next one.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum BatchScheduling {
    /// Batches are launched back to back. The next batch starts while earlier batches
    /// may still be tearing down. At large pool sizes this means many task units are
    /// alive at the same time.
    #[default]
    Overlapped,

    /// Each batch is torn down completely before the next one is launched.
    Sequential,
}

/// Parameters of a benchmark run.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use fanout_bench::{BatchScheduling, BenchConfig};
///
/// let config = BenchConfig::builder()
///     .repetitions(3)
///     .max_pool_size(100)
///     .scheduling(BatchScheduling::Sequential)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     config.pool_sizes().map(NonZero::get).collect::<Vec<_>>(),
///     vec![1, 10, 100]
/// );
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BenchConfig {
    repetitions: NonZero<u32>,
    max_pool_size: NonZero<usize>,
    scheduling: BatchScheduling,
    worker_threads: Option<NonZero<usize>>,
}

impl BenchConfig {
    /// Default number of times every batch is repeated.
    pub const DEFAULT_REPETITIONS: NonZero<u32> = nz!(10);

    /// Default upper bound of the pool size sequence.
    pub const DEFAULT_MAX_POOL_SIZE: NonZero<usize> = nz!(1_000_000);

    /// Starts configuring a benchmark run with default values.
    pub fn builder() -> BenchConfigBuilder {
        BenchConfigBuilder::default()
    }

    /// How many times each (strategy, pool size) batch is measured.
    #[must_use]
    pub fn repetitions(&self) -> NonZero<u32> {
        self.repetitions
    }

    /// The largest pool size that may be measured.
    #[must_use]
    pub fn max_pool_size(&self) -> NonZero<usize> {
        self.max_pool_size
    }

    /// Whether batches overlap.
    #[must_use]
    pub fn scheduling(&self) -> BatchScheduling {
        self.scheduling
    }

    /// Number of runtime worker threads, if set explicitly.
    #[must_use]
    pub fn worker_threads(&self) -> Option<NonZero<usize>> {
        self.worker_threads
    }

    /// The pool sizes to measure: 1, 10, 100 and so on, up to and including the maximum.
    pub fn pool_sizes(&self) -> impl Iterator<Item = NonZero<usize>> + use<> {
        let max = self.max_pool_size;

        iter::successors(Some(nz!(1_usize)), |size| size.checked_mul(nz!(10)))
            .take_while(move |size| *size <= max)
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            repetitions: Self::DEFAULT_REPETITIONS,
            max_pool_size: Self::DEFAULT_MAX_POOL_SIZE,
            scheduling: BatchScheduling::default(),
            worker_threads: None,
        }
    }
}

/// Configures a [`BenchConfig`]. Values are validated by [`build()`][Self::build].
#[derive(Clone, Copy, Debug, Default)]
#[must_use]
pub struct BenchConfigBuilder {
    repetitions: Option<u32>,
    max_pool_size: Option<usize>,
    scheduling: BatchScheduling,
    worker_threads: Option<usize>,
}

impl BenchConfigBuilder {
    /// Sets how many times each batch is measured. Must not be zero.
    pub fn repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    /// Sets the largest pool size to measure. Must not be zero.
    pub fn max_pool_size(mut self, max_pool_size: usize) -> Self {
        self.max_pool_size = Some(max_pool_size);
        self
    }

    /// Sets whether batches overlap.
    pub fn scheduling(mut self, scheduling: BatchScheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    /// Sets the number of runtime worker threads. Must not be zero.
    pub fn worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = Some(worker_threads);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any count is zero.
    pub fn build(self) -> Result<BenchConfig> {
        let repetitions = match self.repetitions {
            Some(value) => NonZero::new(value).ok_or_else(|| must_be_positive("repetitions"))?,
            None => BenchConfig::DEFAULT_REPETITIONS,
        };

        let max_pool_size = match self.max_pool_size {
            Some(value) => {
                NonZero::new(value).ok_or_else(|| must_be_positive("maximum pool size"))?
            }
            None => BenchConfig::DEFAULT_MAX_POOL_SIZE,
        };

        let worker_threads = self
            .worker_threads
            .map(|value| {
                NonZero::new(value).ok_or_else(|| must_be_positive("worker thread count"))
            })
            .transpose()?;

        Ok(BenchConfig {
            repetitions,
            max_pool_size,
            scheduling: self.scheduling,
            worker_threads,
        })
    }
}

fn must_be_positive(what: &str) -> Error {
    Error::InvalidConfig {
        problem: format!("{what} must be greater than zero"),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn sizes(max_pool_size: usize) -> Vec<usize> {
        BenchConfig::builder()
            .max_pool_size(max_pool_size)
            .build()
            .unwrap()
            .pool_sizes()
            .map(NonZero::get)
            .collect()
    }

    #[test]
    fn defaults() {
        let config = BenchConfig::builder().build().unwrap();

        assert_eq!(config, BenchConfig::default());
        assert_eq!(config.repetitions().get(), 10);
        assert_eq!(config.max_pool_size().get(), 1_000_000);
        assert_eq!(config.scheduling(), BatchScheduling::Overlapped);
        assert_eq!(config.worker_threads(), None);
    }

    #[test]
    fn pool_sizes_are_geometric_and_inclusive() {
        assert_eq!(sizes(1), vec![1]);
        assert_eq!(sizes(9), vec![1]);
        assert_eq!(sizes(10), vec![1, 10]);
        assert_eq!(sizes(999), vec![1, 10, 100]);
        assert_eq!(
            sizes(1_000_000),
            vec![1, 10, 100, 1_000, 10_000, 100_000, 1_000_000]
        );
    }

    #[test]
    fn pool_sizes_stop_before_overflow() {
        let all = sizes(usize::MAX);

        assert_eq!(all.first(), Some(&1));
        assert!(all.windows(2).all(|pair| pair[1] == pair[0] * 10));
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(matches!(
            BenchConfig::builder().repetitions(0).build(),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            BenchConfig::builder().max_pool_size(0).build(),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            BenchConfig::builder().worker_threads(0).build(),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
