// src/watch/walker.rs

//! Recursive reconciliation of a subtree.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::watch::detector::ChangeDetector;

/// Counters for one walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkReport {
    pub dirs_visited: usize,
    pub files_visited: usize,
    /// Copy/Remove actions dispatched during the walk and its sweep.
    pub actions: usize,
    pub errors: usize,
    /// Stale entries (watches or fingerprints) dropped by the sweep.
    pub swept: usize,
}

/// Walks a directory tree, registering directories and checking files.
///
/// The walk is restartable: running it twice over an unchanged tree emits
/// nothing the second time, because every file decision goes through
/// [`ChangeDetector::determine_action`].
pub struct SubtreeWalker<'a> {
    detector: &'a ChangeDetector,
}

impl<'a> SubtreeWalker<'a> {
    pub fn new(detector: &'a ChangeDetector) -> Self {
        Self { detector }
    }

    pub fn walk_and_register(&self, root: &Path) -> WalkReport {
        let fs = self.detector.fs();
        let mut report = WalkReport::default();

        if !fs.exists(root) {
            debug!(root = %root.display(), "walk root is gone; removing subtree");
            let removed = self.detector.state().lock().watches.remove_subtree(root);
            report.swept += removed;
            self.sweep(root, &HashSet::new(), &HashSet::new(), &mut report);
            return report;
        }

        if !fs.is_dir(root) {
            self.visit_file(root, &mut report);
            return report;
        }

        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut seen_files: HashSet<PathBuf> = HashSet::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            report.dirs_visited += 1;
            self.detector.state().lock().watches.add(&dir);

            let entries = match fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(
                        dir = %dir.display(),
                        error = %format!("{err:#}"),
                        "cannot list directory; skipping"
                    );
                    report.errors += 1;
                    seen_dirs.insert(dir);
                    continue;
                }
            };
            seen_dirs.insert(dir);

            let mut subdirs = Vec::new();
            for entry in entries {
                if self.detector.is_excluded(&entry) {
                    debug!(path = %entry.display(), "skipping excluded path");
                    continue;
                }
                if fs.is_dir(&entry) {
                    if fs.is_symlink(&entry) {
                        debug!(path = %entry.display(), "not following symlinked directory");
                        continue;
                    }
                    if self.detector.forget_replaced_file(&entry).is_some() {
                        report.actions += 1;
                    }
                    subdirs.push(entry);
                } else if fs.is_file(&entry) {
                    self.visit_file(&entry, &mut report);
                    seen_files.insert(entry);
                }
            }
            // Reverse so directories pop in listing order.
            stack.extend(subdirs.into_iter().rev());
        }

        self.sweep(root, &seen_dirs, &seen_files, &mut report);

        if report.actions > 0 || report.errors > 0 || report.swept > 0 {
            info!(root = %root.display(), ?report, "reconciled subtree");
        } else {
            debug!(root = %root.display(), ?report, "subtree unchanged");
        }
        report
    }

    fn visit_file(&self, path: &Path, report: &mut WalkReport) {
        report.files_visited += 1;
        match self.detector.determine_action(path) {
            Ok(Some(_)) => report.actions += 1,
            Ok(None) => {}
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "could not check file; skipping"
                );
                report.errors += 1;
            }
        }
    }

    /// Re-check state entries under `root` that the walk did not see.
    ///
    /// Files are confirmed through the detector (which emits Remove when
    /// they are really gone) unless they have turned into directories, in
    /// which case only their fingerprint is dropped. Directories are
    /// deregistered once they are no longer directories.
    fn sweep(
        &self,
        root: &Path,
        seen_dirs: &HashSet<PathBuf>,
        seen_files: &HashSet<PathBuf>,
        report: &mut WalkReport,
    ) {
        let fs = self.detector.fs();
        let (stale_files, stale_dirs) = {
            let tree = self.detector.state().lock();
            let files: Vec<PathBuf> = tree
                .fingerprints
                .paths_under(root)
                .into_iter()
                .filter(|p| !seen_files.contains(p))
                .collect();
            let dirs: Vec<PathBuf> = tree
                .watches
                .paths_under(root)
                .into_iter()
                .filter(|p| !seen_dirs.contains(p))
                .collect();
            (files, dirs)
        };

        for dir in stale_dirs {
            if fs.is_dir(&dir) {
                continue;
            }
            let removed = self.detector.state().lock().watches.remove_subtree(&dir);
            if removed > 0 {
                debug!(dir = %dir.display(), removed, "dropped stale watch");
                report.swept += removed;
            }
        }

        for file in stale_files {
            // Tracked as a file but now a directory the walk did not enter
            // (excluded or symlinked); re-checking it would walk it again.
            if fs.is_dir(&file) {
                if self.detector.forget_replaced_file(&file).is_some() {
                    report.actions += 1;
                    report.swept += 1;
                }
                continue;
            }
            match self.detector.determine_action(&file) {
                Ok(Some(_)) => {
                    report.actions += 1;
                    report.swept += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        path = %file.display(),
                        error = %format!("{err:#}"),
                        "could not re-check tracked file"
                    );
                    report.errors += 1;
                }
            }
        }
    }
}
