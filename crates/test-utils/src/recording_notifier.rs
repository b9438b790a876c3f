use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use dirmirror::watch::Notifier;

/// Notifier that records registrations instead of talking to the OS.
///
/// Clones share state, so a test can keep one handle while the `WatchSet`
/// owns the boxed other.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<(bool, PathBuf)>>>,
    rejected: Arc<Mutex<HashSet<PathBuf>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `watch(dir)` fail for this directory.
    pub fn reject(&self, dir: impl AsRef<Path>) {
        self.rejected
            .lock()
            .unwrap()
            .insert(dir.as_ref().to_path_buf());
    }

    /// Stop rejecting `dir`.
    pub fn accept(&self, dir: impl AsRef<Path>) {
        self.rejected.lock().unwrap().remove(dir.as_ref());
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(watch, _)| *watch)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn unwatched(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(watch, _)| !*watch)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        if self.rejected.lock().unwrap().contains(dir) {
            return Err(anyhow!("watch rejected for {:?}", dir));
        }
        self.calls.lock().unwrap().push((true, dir.to_path_buf()));
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        self.calls.lock().unwrap().push((false, dir.to_path_buf()));
        Ok(())
    }
}
