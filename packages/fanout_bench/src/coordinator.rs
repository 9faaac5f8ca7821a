//! Runs one batch: spawn the pool, collect registrations, dispatch work, tear down, time.

use std::num::NonZero;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{CompletionCounter, Error, NoProbe, PoolStrategy, Result, UnitHandle, UnitProbe};

/// Starts a batch of `size` task units under `strategy` and returns without waiting for
/// it to finish.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn launch_batch(strategy: PoolStrategy, size: NonZero<usize>) -> BatchHandle {
    launch_batch_with_probe(strategy, size, Arc::new(NoProbe))
}

/// Starts a batch like [`launch_batch()`], reporting every signal the units receive to
/// `probe`.
///
/// The pool is constructed before this function returns. Dispatch, teardown and the
/// timing observer continue in the background on the current runtime.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn launch_batch_with_probe<P: UnitProbe>(
    strategy: PoolStrategy,
    size: NonZero<usize>,
    probe: Arc<P>,
) -> BatchHandle {
    let started = Instant::now();

    let counter = Arc::new(CompletionCounter::new());
    let (registrations_tx, registrations_rx) = mpsc::channel(size.get());

    strategy.start_pool(size, &counter, &probe, &registrations_tx);

    // Only the units were meant to register. Closing our end lets the dispatcher detect
    // a shortfall instead of waiting forever.
    drop(registrations_tx);

    let observer = tokio::spawn({
        let counter = Arc::clone(&counter);

        async move {
            counter.wait().await;
            started.elapsed()
        }
    });

    let dispatcher = tokio::spawn(dispatch(registrations_rx, size));

    tracing::debug!(%strategy, size = size.get(), "batch launched");

    BatchHandle {
        strategy,
        size,
        counter,
        observer,
        dispatcher,
    }
}

/// Runs one complete batch and returns the time from pool creation to the termination
/// of the last task unit.
///
/// # Errors
///
/// Returns an error if a task unit or coordinator task disappears before the batch
/// completes.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub async fn run_batch(strategy: PoolStrategy, size: NonZero<usize>) -> Result<Duration> {
    launch_batch(strategy, size).finish().await
}

/// A batch that has been launched and may still be running.
#[derive(Debug)]
pub struct BatchHandle {
    strategy: PoolStrategy,
    size: NonZero<usize>,
    counter: Arc<CompletionCounter>,
    observer: JoinHandle<Duration>,
    dispatcher: JoinHandle<Result<()>>,
}

impl BatchHandle {
    /// The strategy the batch was launched with.
    #[must_use]
    pub fn strategy(&self) -> PoolStrategy {
        self.strategy
    }

    /// The number of task units in the batch.
    #[must_use]
    pub fn size(&self) -> NonZero<usize> {
        self.size
    }

    /// How many task units of the batch have not yet terminated.
    #[must_use]
    pub fn remaining_units(&self) -> usize {
        self.counter.remaining()
    }

    /// Waits for the batch to be torn down and returns its duration.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatcher could not complete a handshake because its
    /// counterpart was gone, or if a coordinator task panicked.
    pub async fn finish(self) -> Result<Duration> {
        let Self {
            strategy,
            size,
            counter: _,
            observer,
            dispatcher,
        } = self;

        match dispatcher.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                observer.abort();
                return Err(error);
            }
            Err(join_error) => {
                observer.abort();
                return Err(Error::TaskFailed(join_error));
            }
        }

        let elapsed = observer.await?;

        tracing::debug!(%strategy, size = size.get(), ?elapsed, "batch finished");

        Ok(elapsed)
    }
}

/// The coordinator side of the batch protocol.
///
/// Every unit receives its work signal before any unit receives its exit signal. Within
/// each phase, units are addressed in registration order.
async fn dispatch(
    mut registrations: mpsc::Receiver<UnitHandle>,
    size: NonZero<usize>,
) -> Result<()> {
    let mut units = Vec::with_capacity(size.get());

    while units.len() < size.get() {
        let Some(unit) = registrations.recv().await else {
            return Err(Error::RegistrationShortfall {
                expected: size.get(),
                received: units.len(),
            });
        };

        units.push(unit);
    }

    tracing::trace!(size = size.get(), "all units registered, dispatching work");

    for unit in &units {
        unit.work().send().await?;
    }

    tracing::trace!(size = size.get(), "work accepted by all units, sending exit signals");

    for unit in &units {
        unit.exit().send().await?;
    }

    Ok(())
}
