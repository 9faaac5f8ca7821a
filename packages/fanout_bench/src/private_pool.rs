//! Strategy A: every task unit owns a private work signal and a private exit signal.

use std::num::NonZero;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{CompletionCounter, TaskUnit, UnitHandle, UnitProbe, signal};

/// Creates and starts `size` individually addressable task units.
///
/// Each unit registers with `counter` and publishes its handle into `registrations`,
/// which must have room for `size` handles.
pub(crate) fn start_private_pool<P: UnitProbe>(
    size: NonZero<usize>,
    counter: &Arc<CompletionCounter>,
    probe: &Arc<P>,
    registrations: &mpsc::Sender<UnitHandle>,
) {
    for id in 0..size.get() {
        let (work_sender, work) = signal();

        TaskUnit::create(id, work_sender, work, Arc::clone(counter), Arc::clone(probe))
            .start(registrations);
    }
}
