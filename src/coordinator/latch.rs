//! One-shot completion latch.

use tokio::sync::watch;

/// A signal that moves from pending to signaled exactly once.
///
/// Any number of tasks may [`wait`](Self::wait) on it, before or after it
/// fires. Waiters that arrive late return immediately.
#[derive(Debug)]
pub struct CompletionLatch {
    tx: watch::Sender<bool>,
}

impl CompletionLatch {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Fire the latch. Returns `true` only for the call that performed the
    /// pending → signaled transition.
    pub fn signal(&self) -> bool {
        self.tx.send_if_modified(|signaled| {
            if *signaled {
                false
            } else {
                *signaled = true;
                true
            }
        })
    }

    pub fn is_signaled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the latch has fired.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we
        // hold a reference to it.
        let _ = rx.wait_for(|signaled| *signaled).await;
    }
}

impl Default for CompletionLatch {
    fn default() -> Self {
        Self::new()
    }
}
