use std::num::NonZero;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::private_pool::start_private_pool;
use crate::shared_pool::start_shared_pool;
use crate::{CompletionCounter, UnitHandle, UnitProbe};

/// How the task units of a batch receive their work signals.
///
/// The display names are the labels used in benchmark output.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, derive_more::Display)]
pub enum PoolStrategy {
    /// Every unit has its own work signal, so the coordinator addresses units
    /// individually.
    #[display("with dispatcher")]
    PrivateChannels,

    /// All units share one work signal, and each signal goes to whichever unit is ready
    /// first.
    #[display("without dispatcher")]
    SharedChannel,
}

impl PoolStrategy {
    /// Every strategy, in the order the benchmark runs and reports them.
    pub const ALL: [Self; 2] = [Self::PrivateChannels, Self::SharedChannel];

    /// Creates and starts `size` task units under this strategy.
    pub(crate) fn start_pool<P: UnitProbe>(
        self,
        size: NonZero<usize>,
        counter: &Arc<CompletionCounter>,
        probe: &Arc<P>,
        registrations: &mpsc::Sender<UnitHandle>,
    ) {
        match self {
            Self::PrivateChannels => start_private_pool(size, counter, probe, registrations),
            Self::SharedChannel => start_shared_pool(size, counter, probe, registrations),
        }
    }
}
