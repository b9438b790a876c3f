// src/watch/detector.rs

//! Per-path change decision.
//!
//! [`ChangeDetector::determine_action`] is the only place that decides
//! whether a path needs a Copy or a Remove. Both the notification consumer
//! and the periodic walk funnel through it, so the two producers can never
//! disagree about what "changed" means.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::dispatch::ActionDispatcher;
use crate::fs::FileSystem;
use crate::types::Action;
use crate::watch::fingerprint::compute_fingerprint;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::ExcludeSet;
use crate::watch::state::{SyncState, TrackedTree};
use crate::watch::walker::{SubtreeWalker, WalkReport};

#[derive(Debug)]
pub struct ChangeDetector {
    fs: Arc<dyn FileSystem>,
    state: Arc<SyncState>,
    dispatcher: ActionDispatcher,
    root: PathBuf,
    excludes: ExcludeSet,
}

impl ChangeDetector {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        state: Arc<SyncState>,
        dispatcher: ActionDispatcher,
        root: impl Into<PathBuf>,
        excludes: ExcludeSet,
    ) -> Self {
        Self {
            fs,
            state,
            dispatcher,
            root: root.into(),
            excludes,
        }
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True if `path` matches an exclude glob (itself or an ancestor), or
    /// lies outside the watched root altogether.
    pub fn is_excluded(&self, path: &Path) -> bool {
        match relative_str(&self.root, path) {
            Some(rel) => self.excludes.is_excluded(&rel),
            None => true,
        }
    }

    /// Decide and emit the action for one path.
    ///
    /// Returns the action that was dispatched, if any. Directories never
    /// produce an action themselves: a present directory is walked and
    /// registered, a vanished one is deregistered together with its watched
    /// descendants.
    ///
    /// An error means the file could not be read (typically because it
    /// vanished after the existence check). Nothing is dispatched in that
    /// case and the caller is expected to log and move on.
    pub fn determine_action(&self, path: &Path) -> Result<Option<Action>> {
        if path.as_os_str().is_empty() {
            return Ok(None);
        }
        if self.is_excluded(path) {
            debug!(path = %path.display(), "ignoring excluded path");
            return Ok(None);
        }

        if !self.fs.exists(path) {
            return Ok(self.handle_missing(path));
        }

        if self.fs.is_dir(path) {
            if self.fs.is_symlink(path) {
                debug!(path = %path.display(), "not following symlinked directory");
                return Ok(None);
            }
            let replaced = self.forget_replaced_file(path);
            let report = SubtreeWalker::new(self).walk_and_register(path);
            debug!(path = %path.display(), ?report, "registered directory");
            return Ok(replaced);
        }

        if !self.fs.is_file(path) {
            debug!(path = %path.display(), "not a regular file; ignoring");
            return Ok(None);
        }

        // Hash outside the lock; only the compare-and-store is serialized.
        let fingerprint = compute_fingerprint(self.fs.as_ref(), path)
            .with_context(|| format!("fingerprinting {:?}", path))?;

        let mut tree = self.state.lock();

        // Deleted while we were hashing. Storing now would resurrect it and
        // order a Copy after the Remove the deletion already produced.
        if !self.fs.is_file(path) {
            return Ok(self.remove_locked(&mut tree, path));
        }

        if tree.watches.contains(path) {
            self.retire_directory(&mut tree, path);
        }

        let update = tree.fingerprints.update(path, fingerprint);
        if !update.is_change() {
            debug!(path = %path.display(), "content unchanged");
            return Ok(None);
        }

        debug!(path = %path.display(), ?update, %fingerprint, "content changed");
        let action = Action::copy(path);
        // Dispatch while still holding the lock so per-path submission
        // order matches decision order.
        self.dispatcher.dispatch(action.clone());
        Ok(Some(action))
    }

    /// Removal path of [`determine_action`](Self::determine_action).
    pub(crate) fn handle_missing(&self, path: &Path) -> Option<Action> {
        let mut tree = self.state.lock();
        self.remove_locked(&mut tree, path)
    }

    fn remove_locked(&self, tree: &mut TrackedTree, path: &Path) -> Option<Action> {
        // Recreated since the caller looked; the event for the new file
        // (or the next rescan) picks it up.
        if self.fs.exists(path) {
            debug!(path = %path.display(), "path reappeared; skipping removal");
            return None;
        }

        let removed = tree.watches.remove_subtree(path);
        if removed > 0 {
            debug!(path = %path.display(), removed, "deregistered vanished directory");
            return None;
        }

        if tree.fingerprints.remove(path).is_none() {
            debug!(path = %path.display(), "never synced; nothing to remove");
            return None;
        }

        let action = Action::remove(path);
        self.dispatcher.dispatch(action.clone());
        Some(action)
    }

    /// Drop the fingerprint of a file that is now a directory, emitting a
    /// Remove for the old object so the directory's children can take its
    /// place remotely.
    pub(crate) fn forget_replaced_file(&self, path: &Path) -> Option<Action> {
        let mut tree = self.state.lock();
        tree.fingerprints.remove(path)?;
        debug!(path = %path.display(), "file replaced by directory");
        let action = Action::remove(path);
        self.dispatcher.dispatch(action.clone());
        Some(action)
    }

    /// A watched directory has become a file: deregister it and remove
    /// every file that was tracked beneath it.
    fn retire_directory(&self, tree: &mut TrackedTree, path: &Path) {
        let removed = tree.watches.remove_subtree(path);
        let stale: Vec<PathBuf> = tree
            .fingerprints
            .paths_under(path)
            .into_iter()
            .filter(|p| p != path)
            .collect();
        debug!(path = %path.display(), removed, files = stale.len(), "directory replaced by file");
        for file in stale {
            tree.fingerprints.remove(&file);
            self.dispatcher.dispatch(Action::remove(file));
        }
    }

    /// Entry point for the notification consumer: never fails, only logs.
    pub fn handle_notification(&self, path: &Path) {
        match self.determine_action(path) {
            Ok(Some(action)) => {
                debug!(path = %path.display(), kind = %action.kind, "notification produced action");
            }
            Ok(None) => {}
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "could not process change; skipping"
                );
            }
        }
    }

    /// Full pass over the watched root.
    pub fn reconcile(&self) -> WalkReport {
        SubtreeWalker::new(self).walk_and_register(&self.root)
    }
}
