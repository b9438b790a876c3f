//! Ordered set of directories currently registered with the notifier.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::watch::notifier::Notifier;

/// Sorted, duplicate-free list of watched directories.
///
/// Sorting uses `Path`'s component-wise ordering, which keeps every
/// directory's watched descendants contiguous right after it; subtree removal
/// relies on that.
pub struct WatchSet {
    dirs: Vec<PathBuf>,
    notifier: Box<dyn Notifier>,
}

impl fmt::Debug for WatchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSet")
            .field("dirs", &self.dirs)
            .finish_non_exhaustive()
    }
}

impl WatchSet {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            dirs: Vec::new(),
            notifier,
        }
    }

    /// Register `dir` if it is not already watched.
    ///
    /// Returns true if a new watch was added. A notifier rejection leaves the
    /// set unchanged so the next reconciliation pass retries.
    pub fn add(&mut self, dir: &Path) -> bool {
        let pos = match self.position(dir) {
            Ok(_) => {
                debug!(dir = %dir.display(), "skipping: already watching it");
                return false;
            }
            Err(pos) => pos,
        };

        if let Err(err) = self.notifier.watch(dir) {
            warn!(dir = %dir.display(), error = %err, "failed to register watch");
            return false;
        }

        debug!(dir = %dir.display(), "adding to watch list");
        self.dirs.insert(pos, dir.to_path_buf());
        true
    }

    /// Unregister `dir`. Returns whether it was being watched.
    pub fn remove(&mut self, dir: &Path) -> bool {
        match self.position(dir) {
            Ok(pos) => {
                let removed = self.dirs.remove(pos);
                self.unwatch(&removed);
                true
            }
            Err(_) => false,
        }
    }

    /// Unregister `dir` and every watched directory below it.
    ///
    /// Returns how many entries were removed.
    pub fn remove_subtree(&mut self, dir: &Path) -> usize {
        let start = self.dirs.partition_point(|p| p.as_path() < dir);
        let len = self.dirs[start..]
            .iter()
            .take_while(|p| p.starts_with(dir))
            .count();

        let removed: Vec<PathBuf> = self.dirs.drain(start..start + len).collect();
        for d in &removed {
            self.unwatch(d);
        }
        removed.len()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.position(dir).is_ok()
    }

    /// Watched directories at or below `root`, in sorted order.
    pub fn paths_under(&self, root: &Path) -> Vec<PathBuf> {
        let start = self.dirs.partition_point(|p| p.as_path() < root);
        self.dirs[start..]
            .iter()
            .take_while(|p| p.starts_with(root))
            .cloned()
            .collect()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    fn position(&self, dir: &Path) -> Result<usize, usize> {
        self.dirs.binary_search_by(|p| p.as_path().cmp(dir))
    }

    fn unwatch(&mut self, dir: &Path) {
        debug!(dir = %dir.display(), "removing from watch list");
        // The OS usually drops the watch itself once the directory is gone.
        if let Err(err) = self.notifier.unwatch(dir) {
            debug!(dir = %dir.display(), error = %err, "unwatch failed");
        }
    }
}
