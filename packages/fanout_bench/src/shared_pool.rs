//! Strategy B: all task units race for one shared work signal, while each still owns a
//! private exit signal.

use std::num::NonZero;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{CompletionCounter, SharedSignalReceiver, TaskUnit, UnitHandle, UnitProbe, signal};

/// Creates and starts `size` task units that share a single work signal.
///
/// Every published handle carries a clone of the same work sender. A work signal sent
/// through any of them is accepted by whichever unit is ready first.
pub(crate) fn start_shared_pool<P: UnitProbe>(
    size: NonZero<usize>,
    counter: &Arc<CompletionCounter>,
    probe: &Arc<P>,
    registrations: &mpsc::Sender<UnitHandle>,
) {
    let (work_sender, work) = signal();
    let work = SharedSignalReceiver::new(work);

    for id in 0..size.get() {
        TaskUnit::create(
            id,
            work_sender.clone(),
            work.clone(),
            Arc::clone(counter),
            Arc::clone(probe),
        )
        .start(registrations);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use new_zealand::nz;
    use testing::with_runtime_watchdog;

    use super::*;
    use crate::UnitId;

    #[derive(Debug, Default)]
    struct WorkTally(AtomicUsize);

    impl UnitProbe for WorkTally {
        fn work_received(&self, _unit: UnitId) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn registers_every_unit_in_creation_order() {
        with_runtime_watchdog(async {
            let counter = Arc::new(CompletionCounter::new());
            let (registrations_tx, mut registrations_rx) = mpsc::channel(5);

            let tally = Arc::new(WorkTally::default());
            start_shared_pool(nz!(5), &counter, &tally, &registrations_tx);
            drop(registrations_tx);

            let mut ids = Vec::new();
            while let Some(handle) = registrations_rx.recv().await {
                ids.push(handle.id());
            }

            assert_eq!(ids, vec![0, 1, 2, 3, 4]);
            assert_eq!(counter.remaining(), 5);

            // Every handle is gone, so every exit signal is closed.
            counter.wait().await;
        });
    }

    #[test]
    fn one_send_is_received_exactly_once() {
        with_runtime_watchdog(async {
            let counter = Arc::new(CompletionCounter::new());
            let tally = Arc::new(WorkTally::default());
            let (registrations_tx, mut registrations_rx) = mpsc::channel(4);

            start_shared_pool(nz!(4), &counter, &tally, &registrations_tx);

            let mut handles = Vec::new();
            for _ in 0..4 {
                handles.push(registrations_rx.recv().await.unwrap());
            }

            // Any handle reaches the pool, not a particular unit.
            handles[3].work().send().await.unwrap();
            assert_eq!(tally.0.load(Ordering::SeqCst), 1);

            for handle in &handles {
                handle.exit().send().await.unwrap();
            }

            counter.wait().await;
            assert_eq!(tally.0.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn shared_signal_survives_while_any_unit_listens() {
        with_runtime_watchdog(async {
            let counter = Arc::new(CompletionCounter::new());
            let tally = Arc::new(WorkTally::default());
            let (registrations_tx, mut registrations_rx) = mpsc::channel(3);

            start_shared_pool(nz!(3), &counter, &tally, &registrations_tx);

            let mut handles = Vec::new();
            for _ in 0..3 {
                handles.push(registrations_rx.recv().await.unwrap());
            }

            // Stop two of the three units. The survivor receives everything.
            handles[0].exit().send().await.unwrap();
            handles[1].exit().send().await.unwrap();

            for _ in 0..5 {
                handles[0].work().send().await.unwrap();
            }

            assert_eq!(tally.0.load(Ordering::SeqCst), 5);

            handles[2].exit().send().await.unwrap();
            counter.wait().await;
        });
    }
}
