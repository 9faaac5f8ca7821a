use std::io;

use thiserror::Error;
use tokio::task::JoinError;

/// Errors that can occur while configuring or running a benchmark.
///
/// A correctly wired batch never produces an error. If one of its handshakes never
/// completes, the batch blocks instead. Errors surface only when a participant has
/// disappeared, for example because a task panicked, or when the configuration is
/// unusable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The benchmark configuration cannot be used.
    #[error("invalid benchmark configuration: {problem}")]
    InvalidConfig {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// A signal was sent but the receiving side no longer exists.
    #[error("signal receiver is gone, the handshake cannot complete")]
    SignalClosed,

    /// The registration queue closed before every task unit had registered.
    #[error("expected {expected} task units to register but only {received} did")]
    RegistrationShortfall {
        /// How many task units the batch was created with.
        expected: usize,

        /// How many handles were drained before the queue closed.
        received: usize,
    },

    /// A coordinator task panicked or was cancelled.
    #[error("batch coordination task failed: {0}")]
    TaskFailed(#[from] JoinError),

    /// Writing progress output or starting the runtime failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A specialized `Result` type for benchmark operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn shortfall_message_names_both_counts() {
        let error = Error::RegistrationShortfall {
            expected: 10,
            received: 7,
        };

        let message = error.to_string();
        assert!(message.contains("10"));
        assert!(message.contains('7'));
    }

    #[test]
    fn io_errors_convert() {
        let source = io::Error::other("pipe closed");
        let error: Error = source.into();

        assert!(matches!(error, Error::Io(_)));
    }
}
