//! Unbuffered signals with rendezvous semantics.
//!
//! A send completes only once a receiver has taken the signal and acknowledged it. Each
//! signal carries a one-shot acknowledgement channel. The receiver hands that back to
//! its caller as a [`Handshake`], so the receiving side can act on the signal before
//! the sender is released.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::{Error, Result};

type Ack = oneshot::Sender<()>;

/// Creates a new unbuffered signal, returning the sending and receiving halves.
///
/// The sender may be cloned freely. The receiver can be used directly by one task or
/// wrapped in a [`SharedSignalReceiver`] to be raced for by many tasks.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (sender, mut receiver) = fanout_bench::signal();
///
/// let send = tokio::spawn(async move { sender.send().await });
///
/// let handshake = receiver.recv().await.unwrap();
/// handshake.complete();
///
/// send.await.unwrap().unwrap();
/// # }
/// ```
#[must_use]
pub fn signal() -> (SignalSender, SignalReceiver) {
    // One slot is enough. The sender waits for the acknowledgement before it can send
    // again, so at most one signal per sender is ever in flight.
    let (tx, rx) = mpsc::channel(1);

    (SignalSender { tx }, SignalReceiver { rx })
}

/// The sending half of a signal created by [`signal()`].
#[derive(Clone, Debug)]
pub struct SignalSender {
    tx: mpsc::Sender<Ack>,
}

impl SignalSender {
    /// Sends one signal and waits until a receiver has accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignalClosed`] if the receiving half is dropped before the
    /// signal is acknowledged.
    pub async fn send(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();

        if self.tx.send(ack_tx).await.is_err() {
            return Err(Error::SignalClosed);
        }

        ack_rx
            .await
            .map_err(|oneshot::RecvError| Error::SignalClosed)
    }
}

/// The receiving half of a signal created by [`signal()`].
#[derive(Debug)]
pub struct SignalReceiver {
    rx: mpsc::Receiver<Ack>,
}

impl SignalReceiver {
    /// Waits for the next signal.
    ///
    /// Returns `None` once every sender has been dropped and no signal is pending.
    ///
    /// This method is cancel safe. If it is dropped before it completes, no signal is
    /// lost and no sender is released.
    pub async fn recv(&mut self) -> Option<Handshake> {
        self.rx.recv().await.map(|ack| Handshake { ack: Some(ack) })
    }
}

/// A receiving half that many tasks may wait on at the same time.
///
/// Each signal is delivered to exactly one of the waiting tasks. Which one is not
/// specified.
#[derive(Clone, Debug)]
pub struct SharedSignalReceiver {
    inner: Arc<Mutex<SignalReceiver>>,
}

impl SharedSignalReceiver {
    /// Turns a receiver into one that can be cloned and shared between tasks.
    #[must_use]
    pub fn new(receiver: SignalReceiver) -> Self {
        Self {
            inner: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Waits until this task wins the next signal.
    ///
    /// Cancel safe in the same way as [`SignalReceiver::recv`].
    pub async fn recv(&self) -> Option<Handshake> {
        self.inner.lock().await.recv().await
    }
}

/// Proof that a signal was received. Completing or dropping it releases the sender.
#[derive(derive_more::Debug)]
#[must_use = "the sender stays blocked until the handshake is completed or dropped"]
pub struct Handshake {
    #[debug(ignore)]
    ack: Option<Ack>,
}

impl Handshake {
    /// Releases the sender that is waiting on this signal.
    pub fn complete(mut self) {
        self.acknowledge();
    }

    fn acknowledge(&mut self) {
        if let Some(ack) = self.ack.take() {
            // If the sender gave up waiting, there is nobody left to release.
            drop(ack.send(()));
        }
    }
}

impl Drop for Handshake {
    fn drop(&mut self) {
        self.acknowledge();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use static_assertions::assert_impl_all;
    use testing::with_runtime_watchdog;

    use super::*;

    assert_impl_all!(SignalSender: Send, Sync, Clone);
    assert_impl_all!(SignalReceiver: Send);
    assert_impl_all!(SharedSignalReceiver: Send, Sync, Clone);
    assert_impl_all!(Handshake: Send);

    #[test]
    fn send_completes_after_receive() {
        with_runtime_watchdog(async {
            let (sender, mut receiver) = signal();

            let send = tokio::spawn(async move { sender.send().await });

            receiver.recv().await.unwrap().complete();

            send.await.unwrap().unwrap();
        });
    }

    #[test]
    fn sender_is_held_until_handshake_completes() {
        with_runtime_watchdog(async {
            let (sender, mut receiver) = signal();

            let mut send = tokio::spawn(async move { sender.send().await });

            let handshake = receiver.recv().await.unwrap();

            // While we hold the handshake, the sender cannot finish.
            let early = tokio::time::timeout(Duration::from_millis(50), &mut send).await;
            assert!(early.is_err());

            handshake.complete();

            send.await.unwrap().unwrap();
        });
    }

    #[test]
    fn dropped_handshake_also_releases_sender() {
        with_runtime_watchdog(async {
            let (sender, mut receiver) = signal();

            let send = tokio::spawn(async move { sender.send().await });

            drop(receiver.recv().await.unwrap());

            send.await.unwrap().unwrap();
        });
    }

    #[test]
    fn send_to_dropped_receiver_fails() {
        with_runtime_watchdog(async {
            let (sender, receiver) = signal();
            drop(receiver);

            let result = sender.send().await;

            assert!(matches!(result, Err(Error::SignalClosed)));
        });
    }

    #[test]
    fn recv_returns_none_when_senders_are_gone() {
        with_runtime_watchdog(async {
            let (sender, mut receiver) = signal();
            drop(sender);

            assert!(receiver.recv().await.is_none());
        });
    }

    #[test]
    fn shared_receiver_delivers_each_signal_once() {
        const RECEIVERS: usize = 8;
        const SIGNALS: usize = 8;

        with_runtime_watchdog(async {
            let (sender, receiver) = signal();
            let receiver = SharedSignalReceiver::new(receiver);
            let received = Arc::new(AtomicUsize::new(0));

            let tasks = (0..RECEIVERS)
                .map(|_| {
                    let receiver = receiver.clone();
                    let received = Arc::clone(&received);

                    tokio::spawn(async move {
                        while let Some(handshake) = receiver.recv().await {
                            received.fetch_add(1, Ordering::SeqCst);
                            handshake.complete();
                        }
                    })
                })
                .collect::<Vec<_>>();

            drop(receiver);

            for _ in 0..SIGNALS {
                sender.send().await.unwrap();
            }

            // Every send has been acknowledged, so every signal has been counted.
            assert_eq!(received.load(Ordering::SeqCst), SIGNALS);

            drop(sender);

            for task in tasks {
                task.await.unwrap();
            }

            assert_eq!(received.load(Ordering::SeqCst), SIGNALS);
        });
    }
}
