#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;

use dirmirror::dispatch::ActionDispatcher;
use dirmirror::fs::RealFileSystem;
use dirmirror::types::{Action, ActionKind};
use dirmirror::watch::{ChangeDetector, ExcludeSet, SyncState};

pub use dirmirror_test_utils::{init_tracing, with_timeout, RecordingNotifier, RecordingStore};

/// A detector over a real temporary directory, with the dispatched actions
/// collected instead of executed.
pub struct Harness {
    _dir: TempDir,
    pub root: PathBuf,
    pub notifier: RecordingNotifier,
    pub detector: Arc<ChangeDetector>,
    actions: mpsc::UnboundedReceiver<Action>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_excludes(&[])
    }

    pub fn with_excludes(patterns: &[&str]) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let notifier = RecordingNotifier::new();
        let state = Arc::new(SyncState::new(Box::new(notifier.clone())));
        let (dispatcher, actions) = ActionDispatcher::channel();
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        let detector = Arc::new(ChangeDetector::new(
            Arc::new(RealFileSystem),
            state,
            dispatcher,
            root.clone(),
            ExcludeSet::new(&patterns).unwrap(),
        ));
        Self {
            _dir: dir,
            root,
            notifier,
            detector,
            actions,
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let p = self.path(rel);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(p, contents).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.path(rel)).unwrap();
    }

    pub fn remove(&self, rel: &str) {
        let p = self.path(rel);
        if p.is_dir() {
            fs::remove_dir_all(p).unwrap();
        } else {
            fs::remove_file(p).unwrap();
        }
    }

    pub fn notify(&self, rel: &str) {
        self.detector.handle_notification(&self.path(rel));
    }

    pub fn is_watched(&self, rel: &str) -> bool {
        self.detector.state().is_watched(&self.path(rel))
    }

    /// Dispatched actions since the last call, as `(kind, root-relative path)`.
    pub fn take_actions(&mut self) -> Vec<(ActionKind, String)> {
        let mut out = Vec::new();
        while let Ok(action) = self.actions.try_recv() {
            out.push((action.kind, rel(&self.root, &action.path)));
        }
        out
    }
}

fn rel(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap()
        .to_string_lossy()
        .replace('\\', "/")
}

pub fn copy(rel: &str) -> (ActionKind, String) {
    (ActionKind::Copy, rel.to_string())
}

pub fn remove(rel: &str) -> (ActionKind, String) {
    (ActionKind::Remove, rel.to_string())
}
