// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled exclude globs, evaluated against paths relative to the watched
/// root (e.g. `"logs/today.txt"`).
///
/// A path is excluded when it, or any of its ancestors below the root,
/// matches. Excluding `"build"` therefore skips everything under `build/`
/// as well, and an excluded directory is never watched.
#[derive(Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl fmt::Debug for ExcludeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludeSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl ExcludeSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let set = build_globset(patterns).context("building exclude globset")?;
        Ok(Self {
            patterns: patterns.to_vec(),
            set: Some(set),
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the root-relative path `rel_path` should be skipped.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        let Some(set) = &self.set else {
            return false;
        };
        Path::new(rel_path)
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| set.is_match(p))
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> ExcludeSet {
        let owned: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        ExcludeSet::new(&owned).unwrap()
    }

    #[test]
    fn empty_set_excludes_nothing() {
        let s = ExcludeSet::default();
        assert!(!s.is_excluded("anything.txt"));
    }

    #[test]
    fn extension_glob_matches_at_any_depth() {
        let s = set(&["*.swp"]);
        assert!(s.is_excluded("notes.swp"));
        assert!(s.is_excluded("deep/dir/notes.swp"));
        assert!(!s.is_excluded("notes.txt"));
    }

    #[test]
    fn excluded_directory_covers_descendants() {
        let s = set(&["build"]);
        assert!(s.is_excluded("build"));
        assert!(s.is_excluded("build/out/app.bin"));
        assert!(!s.is_excluded("src/build.rs"));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let err = ExcludeSet::new(&["[".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("invalid glob pattern"));
    }
}
