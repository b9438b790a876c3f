use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;

use crate::fs::FileSystem;

/// blake3 digest of a file's contents at the time it was last observed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(blake3::Hash);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first 12 hex chars are plenty to tell versions apart in logs.
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Compute the fingerprint of a single file, streaming its contents.
pub fn compute_fingerprint(fs: &dyn FileSystem, path: &Path) -> Result<Fingerprint> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading file for hashing: {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Fingerprint(hasher.finalize()))
}

/// Outcome of offering a freshly computed fingerprint to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintUpdate {
    /// No previous fingerprint: first time this file is seen.
    New,
    /// Previous fingerprint differed and was replaced.
    Changed,
    /// Same content as last time; nothing stored.
    Unchanged,
}

impl FingerprintUpdate {
    pub fn is_change(self) -> bool {
        !matches!(self, FingerprintUpdate::Unchanged)
    }
}

/// Last observed content fingerprint per file path.
///
/// A path is present only while it is believed to exist as a regular file.
#[derive(Debug, Default)]
pub struct FingerprintMap {
    entries: HashMap<PathBuf, Fingerprint>,
}

impl FingerprintMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Fingerprint> {
        self.entries.get(path).copied()
    }

    /// Compare-and-store in one step.
    pub fn update(&mut self, path: &Path, fingerprint: Fingerprint) -> FingerprintUpdate {
        match self.entries.get_mut(path) {
            Some(existing) if *existing == fingerprint => FingerprintUpdate::Unchanged,
            Some(existing) => {
                *existing = fingerprint;
                FingerprintUpdate::Changed
            }
            None => {
                self.entries.insert(path.to_path_buf(), fingerprint);
                FingerprintUpdate::New
            }
        }
    }

    pub fn remove(&mut self, path: &Path) -> Option<Fingerprint> {
        self.entries.remove(path)
    }

    /// Tracked file paths at or below `root`, sorted.
    pub fn paths_under(&self, root: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .entries
            .keys()
            .filter(|p| p.starts_with(root))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
