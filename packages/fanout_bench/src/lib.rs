#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Measures the wall-clock cost of creating, coordinating and tearing down a pool of
//! concurrently running lightweight tasks.
//!
//! A *batch* spawns N task units as Tokio tasks. Each unit waits for either a work
//! signal or an exit signal. The batch coordinator collects the units' registrations,
//! sends every unit one work signal, then sends every unit its exit signal. It measures
//! the time until the last unit has terminated. All signals are unbuffered: a send
//! completes only when the receiving unit has accepted it.
//!
//! Two [`PoolStrategy`] variants are compared:
//!
//! - [`PoolStrategy::PrivateChannels`]: every unit has its own work signal.
//! - [`PoolStrategy::SharedChannel`]: all units of a batch share one work signal, and
//!   each send goes to whichever unit is ready first.
//!
//! Exit signals are always private.
//!
//! The [`run_benchmark()`] driver repeats batches over the pool sizes 1, 10, 100 and so
//! on, and collects the durations into [`BenchmarkResults`] for reporting.
//!
//! # Example
//!
//! ```
//! use fanout_bench::{PoolStrategy, run_batch};
//! use new_zealand::nz;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let elapsed = run_batch(PoolStrategy::SharedChannel, nz!(1000))
//!     .await
//!     .unwrap();
//!
//! println!("1000 tasks spawned, signaled and torn down in {elapsed:?}");
//! # }
//! ```
//!
//! This package is not a general-purpose worker pool. It has no load balancing, no
//! back-pressure and no way for task units to report failures. It exists to produce
//! timing numbers for the two coordination patterns above.

mod completion;
mod config;
mod coordinator;
mod driver;
mod error;
mod private_pool;
mod results;
mod shared_pool;
mod signal;
mod strategy;
mod task_unit;

pub use completion::*;
pub use config::*;
pub use coordinator::*;
pub use driver::*;
pub use error::*;
pub use results::*;
pub use signal::*;
pub use strategy::*;
pub use task_unit::*;
