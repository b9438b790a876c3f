// src/dispatch/pool.rs

//! Bounded worker pool executing dispatched actions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dispatch::store::RemoteStore;
use crate::types::{Action, ActionKind};
use crate::watch::path_utils::remote_key;

/// Maps local paths under the watched root to remote keys.
#[derive(Debug, Clone)]
pub struct RemoteKeys {
    root: PathBuf,
    prefix: String,
}

impl RemoteKeys {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn key_for(&self, path: &Path) -> Option<String> {
        remote_key(&self.prefix, &self.root, path)
    }
}

/// Handle to the background pool loop.
///
/// The pool runs until every [`ActionDispatcher`] clone has been dropped;
/// [`WorkerPool::join`] then waits for the remaining jobs.
///
/// Execution rules:
/// - at most `workers` jobs transfer at the same time;
/// - jobs for the **same path** run one after another in submission order,
///   so a Copy followed by a Remove can never overtake each other;
/// - every submitted action runs exactly once; failures are logged, not
///   retried.
///
/// [`ActionDispatcher`]: crate::dispatch::ActionDispatcher
pub struct WorkerPool {
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").finish_non_exhaustive()
    }
}

impl WorkerPool {
    pub fn spawn(
        mut rx: mpsc::UnboundedReceiver<Action>,
        store: Arc<dyn RemoteStore>,
        keys: RemoteKeys,
        workers: usize,
    ) -> Self {
        let workers = workers.max(1);

        let handle = tokio::spawn(async move {
            info!(workers, store = store.name(), "worker pool started");

            let permits = Arc::new(Semaphore::new(workers));
            // Latest job per path; a new job for the same path waits on it.
            let mut last_job: HashMap<PathBuf, JoinHandle<()>> = HashMap::new();

            while let Some(action) = rx.recv().await {
                last_job.retain(|_, h| !h.is_finished());

                let previous = last_job.remove(&action.path);
                let path = action.path.clone();
                let job = tokio::spawn(run_job(
                    action,
                    previous,
                    Arc::clone(&permits),
                    Arc::clone(&store),
                    keys.clone(),
                ));
                last_job.insert(path, job);
            }

            debug!(pending = last_job.len(), "action channel closed; draining jobs");
            // Earlier jobs for a path are awaited by the later ones, so the
            // latest handle per path covers everything still running.
            for (_, job) in last_job.drain() {
                if let Err(err) = job.await {
                    error!(error = %err, "transfer job panicked");
                }
            }

            info!("worker pool finished");
        });

        Self { handle }
    }

    /// Wait for the pool to drain. Only returns once all dispatchers are gone.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            error!(error = %err, "worker pool loop panicked");
        }
    }
}

async fn run_job(
    action: Action,
    previous: Option<JoinHandle<()>>,
    permits: Arc<Semaphore>,
    store: Arc<dyn RemoteStore>,
    keys: RemoteKeys,
) {
    if let Some(previous) = previous {
        if let Err(err) = previous.await {
            warn!(path = %action.path.display(), error = %err, "previous job for path panicked");
        }
    }

    let _permit = match permits.acquire_owned().await {
        Ok(p) => p,
        Err(_) => {
            warn!(path = %action.path.display(), "worker pool closed; dropping job");
            return;
        }
    };

    let Some(key) = keys.key_for(&action.path) else {
        warn!(path = %action.path.display(), "path is outside the watched root; skipping");
        return;
    };

    let result = match action.kind {
        ActionKind::Copy => {
            info!(path = %action.path.display(), key = %key, "copying file");
            store.upload(&action.path, &key).await
        }
        ActionKind::Remove => {
            info!(path = %action.path.display(), key = %key, "removing file");
            store.delete(&key).await
        }
    };

    match result {
        Ok(()) => info!(
            path = %action.path.display(),
            key = %key,
            kind = %action.kind,
            store = store.name(),
            "transfer complete"
        ),
        Err(err) => error!(
            path = %action.path.display(),
            key = %key,
            kind = %action.kind,
            store = store.name(),
            error = %format!("{err:#}"),
            "transfer failed"
        ),
    }
}
