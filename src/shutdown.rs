//! Cooperative stop flag observed by workers between requests.
use std::sync::Arc;

use tokio::sync::watch;

/// One-shot, idempotent cancellation flag.
///
/// Workers poll [`StopSignal::is_stopped`] at the top of every iteration; a
/// request already in flight always runs to completion. Triggering the signal
/// never blocks and may be repeated from any thread or task.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the flag. Returns `true` only for the call that flipped it.
    pub fn stop(&self) -> bool {
        !self.tx.send_replace(true)
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the flag has been raised.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        drop(rx.wait_for(|stopped| *stopped).await);
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
