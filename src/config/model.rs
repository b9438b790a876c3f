// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::RemoteKind;
use crate::watch::ExcludeSet;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [source]
/// root = "/srv/data"
/// exclude = ["**/*.swp", ".git"]
///
/// [remote]
/// kind = "directory"
/// destination = "/mnt/backup"
/// prefix = "data"
///
/// [sync]
/// rescan_interval = "5s"
/// workers = 8
///
/// [logging]
/// level = "info"
/// ```
///
/// All sections are optional; command-line flags fill in or override
/// values before validation turns this into a [`ConfigFile`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub source: SourceSection,

    #[serde(default)]
    pub remote: RemoteSection,

    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[source]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    /// Local directory to mirror. Required (here or via `--src`).
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Globs relative to `root`; a match on a directory skips its subtree.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[remote]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    #[serde(default)]
    pub kind: RemoteKind,

    /// Target directory for `kind = "directory"`.
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Prepended to every remote key, `/`-joined.
    #[serde(default)]
    pub prefix: String,
}

/// `[sync]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    /// Full reconciliation interval (`ms`, `s`, `m`, `h` suffix).
    #[serde(default = "default_rescan_interval")]
    pub rescan_interval: String,

    /// Concurrent transfer jobs. Defaults to the available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_rescan_interval() -> String {
    "5s".to_string()
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            rescan_interval: default_rescan_interval(),
            workers: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
}

/// Validated, immutable configuration used by the rest of the program.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Canonicalized source directory.
    pub root: PathBuf,
    pub excludes: ExcludeSet,
    pub remote_kind: RemoteKind,
    /// Absolute destination; always `Some` for the directory backend.
    pub destination: Option<PathBuf>,
    pub remote_prefix: String,
    pub rescan_interval: Duration,
    pub workers: usize,
    pub logging: LoggingSection,
}
