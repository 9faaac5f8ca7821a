use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Counting barrier that tracks how many task units of a batch have yet to terminate.
///
/// Every unit registers once when it is created and calls [`done()`][Self::done] once
/// when it terminates. [`wait()`][Self::wait] resolves as soon as the count drops to
/// zero, including when it is already zero.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use fanout_bench::CompletionCounter;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let counter = Arc::new(CompletionCounter::new());
/// counter.register();
///
/// tokio::spawn({
///     let counter = Arc::clone(&counter);
///     async move { counter.done() }
/// });
///
/// counter.wait().await;
/// assert_eq!(counter.remaining(), 0);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct CompletionCounter {
    remaining: AtomicUsize,
    reached_zero: Notify,
}

impl CompletionCounter {
    /// Creates a counter with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit that must call [`done()`][Self::done] before waiters are released.
    pub fn register(&self) {
        self.remaining.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks one registered unit as terminated.
    ///
    /// # Panics
    ///
    /// Panics if called more times than [`register()`][Self::register].
    pub fn done(&self) {
        let previous = self.remaining.fetch_sub(1, Ordering::AcqRel);

        assert!(
            previous != 0,
            "completion counter decremented more times than units were registered"
        );

        if previous == 1 {
            self.reached_zero.notify_waiters();
        }
    }

    /// The number of registered units that have not yet terminated.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Waits until every registered unit has terminated.
    pub async fn wait(&self) {
        loop {
            let mut notified = pin!(self.reached_zero.notified());

            // Enlist before checking so that a `done()` racing with us cannot slip between
            // the check and the await.
            notified.as_mut().enable();

            if self.remaining() == 0 {
                return;
            }

            notified.await;
        }
    }
}
