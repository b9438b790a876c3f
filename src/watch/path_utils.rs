// src/watch/path_utils.rs

//! Path helpers shared by the detector, the exclude matcher and the remote
//! key mapping.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`; every path the watcher
///   produces is built from `root`, so this is the normal case and also the
///   only one that works for paths that no longer exist.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    // Helps on platforms (notably macOS) where different absolute prefixes
    // may be used for the same directory (/private/var/...).
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

/// Remote object key for `path`: `prefix` joined with the path relative to
/// `root`, `/`-separated.
///
/// Returns `None` for the root itself or for paths outside `root`.
pub fn remote_key(prefix: &str, root: &Path, path: &Path) -> Option<String> {
    let rel = relative_str(root, path)?;
    if rel.is_empty() {
        return None;
    }
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Some(rel)
    } else {
        Some(format!("{prefix}/{rel}"))
    }
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
