//! Cooperative cancellation for a running batch.

use tokio_util::sync::CancellationToken;

/// Signals a batch to stop dispatching new introspections.
///
/// Clones share the same state. Cancelling is one-way and idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Wait until [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }
}

impl From<CancellationToken> for CancelToken {
    fn from(inner: CancellationToken) -> Self {
        Self { inner }
    }
}
