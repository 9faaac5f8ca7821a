#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing the benchmark harness.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Builder;

/// Worker threads of the test runtime. More than one, so that task units, the dispatcher
/// and the timing observer really run in parallel even on small build machines.
const TEST_WORKER_THREADS: usize = 4;

/// Runs an async test body on a fresh multithreaded Tokio runtime, failing the test if it
/// does not finish in time.
///
/// A batch whose handshakes never complete blocks forever instead of failing, so every
/// test that coordinates task units goes through this watchdog. The limit is 10 seconds,
/// or 60 seconds under Miri.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the time limit is
/// not applied, so that mutation testing can detect mutations that cause hangs.
///
/// Tasks still blocked when the body returns are cancelled as the runtime shuts down.
///
/// # Panics
///
/// Panics if the runtime cannot be created or if the body exceeds the time limit.
///
/// # Example
///
/// ```rust
/// use testing::with_runtime_watchdog;
///
/// let value = with_runtime_watchdog(async {
///     tokio::task::yield_now().await;
///     42
/// });
///
/// assert_eq!(value, 42);
/// ```
pub fn with_runtime_watchdog<F>(test_body: F) -> F::Output
where
    F: Future,
{
    let runtime = Builder::new_multi_thread()
        .worker_threads(TEST_WORKER_THREADS)
        .enable_time()
        .build()
        .expect("test runtime must start");

    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return runtime.block_on(test_body);
    }

    let limit = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    runtime.block_on(async move {
        tokio::time::timeout(limit, test_body)
            .await
            .unwrap_or_else(|elapsed| panic!("test exceeded the {limit:?} watchdog: {elapsed}"))
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn watchdog_returns_body_output() {
        let result = with_runtime_watchdog(async { "hello world" });
        assert_eq!(result, "hello world");
    }

    #[test]
    fn watchdog_body_can_spawn() {
        let result = with_runtime_watchdog(async {
            tokio::spawn(async { 2 + 2 }).await.unwrap()
        });
        assert_eq!(result, 4);
    }
}
