//! Cancellation for long-running batches.
//!
//! Every wait the engine performs — transport backoff, page backoff, the
//! inter-page delay — goes through [`CancelToken::sleep`], so a single
//! [`CancelHandle::cancel`] aborts the current wait and lets the engine skip
//! the remaining pages without corrupting outcomes already produced.
//!
//! Built on a `tokio::sync::watch` channel: the handle owns the sender, any
//! number of token clones observe it.

use std::time::Duration;
use tokio::sync::watch;

/// Owner side: call [`CancelHandle::cancel`] to stop the batch.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        // send() only fails when every receiver is gone, which means there
        // is nothing left to cancel.
        let _ = self.tx.send(true);
    }
}

/// Observer side, held by the engine. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never be cancelled, for callers that don't need it.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Leak-free: dropping the sender leaves the receiver permanently
        // at `false`.
        drop(tx);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `dur`, waking early on cancellation.
    ///
    /// Returns `true` when the full duration elapsed, `false` when the sleep
    /// was cut short by cancellation.
    pub(crate) async fn sleep(&self, dur: Duration) -> bool {
        let mut rx = self.rx.clone();
        let sleep = tokio::time::sleep(dur);
        tokio::pin!(sleep);
        loop {
            if *rx.borrow() {
                return false;
            }
            tokio::select! {
                _ = &mut sleep => return true,
                changed = rx.changed() => {
                    if changed.is_err() {
                        // Sender dropped: no cancellation can ever arrive.
                        sleep.await;
                        return true;
                    }
                }
            }
        }
    }
}

/// Create a linked handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}
