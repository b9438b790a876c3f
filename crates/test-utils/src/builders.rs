#![allow(dead_code)]

use std::path::Path;

use dirmirror::config::{ConfigFile, RawConfigFile};
use dirmirror::types::RemoteKind;

/// Builder for `RawConfigFile` / `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    /// Start from a config mirroring `root` into `destination`.
    pub fn new(root: impl AsRef<Path>, destination: impl AsRef<Path>) -> Self {
        let mut config = RawConfigFile::default();
        config.source.root = Some(root.as_ref().to_path_buf());
        config.remote.kind = RemoteKind::Directory;
        config.remote.destination = Some(destination.as_ref().to_path_buf());
        Self { config }
    }

    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.config.source.exclude.push(pattern.to_string());
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.config.remote.prefix = prefix.to_string();
        self
    }

    pub fn with_remote_kind(mut self, kind: RemoteKind) -> Self {
        self.config.remote.kind = kind;
        self
    }

    pub fn with_interval(mut self, interval: &str) -> Self {
        self.config.sync.rescan_interval = interval.to_string();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.sync.workers = Some(workers);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
