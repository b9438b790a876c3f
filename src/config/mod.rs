// src/config/mod.rs

//! Configuration loading and validation for dirmirror.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and overlay CLI flags (`loader.rs`).
//! - Validate paths, durations and limits into a `ConfigFile` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    apply_overrides, default_config_path, load_and_validate, load_effective, load_from_path,
};
pub use model::{
    ConfigFile, LoggingSection, RawConfigFile, RemoteSection, SourceSection, SyncSection,
};
pub use validate::{parse_duration, MAX_RESCAN_INTERVAL};
