// src/dispatch/dispatcher.rs

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::Action;

/// Submission side of the worker pool.
///
/// `dispatch` never waits: the channel is unbounded and the pool applies its
/// own concurrency limit when executing. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    tx: mpsc::UnboundedSender<Action>,
}

impl ActionDispatcher {
    /// Create a dispatcher and the receiver to hand to [`WorkerPool::spawn`].
    ///
    /// [`WorkerPool::spawn`]: crate::dispatch::WorkerPool::spawn
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn dispatch(&self, action: Action) {
        debug!(path = %action.path.display(), kind = %action.kind, "sending operation");
        if let Err(err) = self.tx.send(action) {
            let action = err.0;
            warn!(
                path = %action.path.display(),
                kind = %action.kind,
                "worker pool has shut down; dropping action"
            );
        }
    }
}
