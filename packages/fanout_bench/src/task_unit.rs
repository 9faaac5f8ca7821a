use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    CompletionCounter, Handshake, SharedSignalReceiver, SignalReceiver, SignalSender, signal,
};

/// Identifies a task unit within its batch, counting from 0 in creation order.
pub type UnitId = usize;

/// Where a task unit receives its work signals from.
///
/// Strategy A gives every unit a private [`SignalReceiver`]. Strategy B gives every unit a
/// clone of one [`SharedSignalReceiver`].
pub trait WorkSignal: Send + 'static {
    /// Waits for the next work signal destined for this unit.
    ///
    /// Must be cancel safe: the receive loop races it against the exit signal.
    fn recv(&mut self) -> impl Future<Output = Option<Handshake>> + Send;
}

impl WorkSignal for SignalReceiver {
    async fn recv(&mut self) -> Option<Handshake> {
        Self::recv(self).await
    }
}

impl WorkSignal for SharedSignalReceiver {
    async fn recv(&mut self) -> Option<Handshake> {
        Self::recv(self).await
    }
}

/// Observes what task units receive.
///
/// The hooks run on the unit's task before the corresponding handshake completes. The
/// coordinator therefore cannot move on before an observation is recorded.
pub trait UnitProbe: Send + Sync + 'static {
    /// A unit accepted a work signal.
    fn work_received(&self, _unit: UnitId) {}

    /// A unit accepted its exit signal and is about to terminate.
    fn exit_received(&self, _unit: UnitId) {}
}

/// A probe that observes nothing. This is what benchmark runs use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProbe;

impl UnitProbe for NoProbe {}

/// What the coordinator holds to address one task unit.
#[derive(Clone, Debug)]
pub struct UnitHandle {
    id: UnitId,
    work: SignalSender,
    exit: SignalSender,
}

impl UnitHandle {
    #[cfg(test)]
    pub(crate) fn for_tests(id: UnitId, work: SignalSender, exit: SignalSender) -> Self {
        Self { id, work, exit }
    }

    /// The identifier of the unit this handle addresses.
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// The sender for work signals.
    ///
    /// Under the shared-channel strategy every handle in the batch holds the same
    /// sender, so a work signal reaches whichever unit is ready first.
    #[must_use]
    pub fn work(&self) -> &SignalSender {
        &self.work
    }

    /// The sender for this unit's private exit signal.
    #[must_use]
    pub fn exit(&self) -> &SignalSender {
        &self.exit
    }
}

/// The minimal concurrently running entity of a batch.
///
/// A unit waits for work or exit signals until it receives an exit signal. It then
/// reports its termination to the batch's [`CompletionCounter`].
#[derive(derive_more::Debug)]
pub struct TaskUnit<W, P> {
    id: UnitId,
    work: W,
    exit: SignalReceiver,
    counter: Arc<CompletionCounter>,
    handle: UnitHandle,

    #[debug(ignore)]
    probe: Arc<P>,
}

impl<W, P> TaskUnit<W, P>
where
    W: WorkSignal,
    P: UnitProbe,
{
    /// Creates a unit with a fresh private exit signal and the given work signal.
    ///
    /// The unit is registered with `counter` immediately, so the batch cannot be
    /// considered finished until this unit has terminated.
    pub fn create(
        id: UnitId,
        work_sender: SignalSender,
        work: W,
        counter: Arc<CompletionCounter>,
        probe: Arc<P>,
    ) -> Self {
        let (exit_sender, exit) = signal();

        counter.register();

        Self {
            id,
            work,
            exit,
            counter,
            handle: UnitHandle {
                id,
                work: work_sender,
                exit: exit_sender,
            },
            probe,
        }
    }

    /// Publishes the unit's handle into the registration queue and spawns its receive
    /// loop on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if the registration queue is full or closed, or if called outside a Tokio
    /// runtime. The queue is sized to the batch, so it is never full when every unit
    /// registers once.
    pub fn start(self, registrations: &mpsc::Sender<UnitHandle>) {
        let Self {
            id,
            work,
            exit,
            counter,
            handle,
            probe,
        } = self;

        registrations
            .try_send(handle)
            .expect("registration queue is sized to hold one handle per unit in the batch");

        tokio::spawn(receive_loop(id, work, exit, counter, probe));
    }
}

async fn receive_loop<W, P>(
    id: UnitId,
    mut work: W,
    mut exit: SignalReceiver,
    counter: Arc<CompletionCounter>,
    probe: Arc<P>,
) where
    W: WorkSignal,
    P: UnitProbe,
{
    loop {
        tokio::select! {
            Some(handshake) = work.recv() => {
                probe.work_received(id);
                handshake.complete();
            }
            handshake = exit.recv() => {
                // A closed exit signal means nobody can ever stop us, so we stop now.
                if let Some(handshake) = handshake {
                    probe.exit_received(id);
                    handshake.complete();
                }

                break;
            }
        }
    }

    counter.done();
}
