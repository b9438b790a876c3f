// src/watch/state.rs

//! Shared mutable state of the watch engine.
//!
//! The watch set and the fingerprint map are guarded by a single mutex. The
//! notification consumer and the reconciliation pass both take it, and every
//! compound check-then-mutate sequence (membership + insert/delete,
//! fingerprint compare + store) happens within one acquisition.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::watch::fingerprint::{Fingerprint, FingerprintMap};
use crate::watch::notifier::Notifier;
use crate::watch::watch_set::WatchSet;

/// Everything the engine remembers about the local tree.
#[derive(Debug)]
pub struct TrackedTree {
    pub watches: WatchSet,
    pub fingerprints: FingerprintMap,
}

/// Owned, lock-protected [`TrackedTree`], shared by `Arc` between the
/// detector, the walker and the runtime.
#[derive(Debug)]
pub struct SyncState {
    inner: Mutex<TrackedTree>,
}

impl SyncState {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            inner: Mutex::new(TrackedTree {
                watches: WatchSet::new(notifier),
                fingerprints: FingerprintMap::new(),
            }),
        }
    }

    /// Take the state lock.
    ///
    /// A panic while holding the lock leaves the tree consistent (each
    /// mutation is a single container operation), so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, TrackedTree> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.lock().watches.contains(dir)
    }

    pub fn fingerprint_of(&self, path: &Path) -> Option<Fingerprint> {
        self.lock().fingerprints.get(path)
    }

    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.lock().watches.paths().to_vec()
    }

    pub fn tracked_files(&self) -> usize {
        self.lock().fingerprints.len()
    }
}
