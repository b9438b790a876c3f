// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag that mirrors a config-file setting overrides the file value
//! when given; see [`crate::config::apply_overrides`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::RemoteKind;

/// Command-line arguments for `dirmirror`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "dirmirror",
    version,
    about = "Mirror a local directory tree to a remote store as it changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Dirmirror.toml` in the current working directory is used
    /// when it exists; otherwise everything comes from flags.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Local source directory to watch.
    #[arg(long, value_name = "DIR")]
    pub src: Option<PathBuf>,

    /// Remote destination (a directory for `--remote-kind directory`).
    #[arg(long, value_name = "DEST")]
    pub dest: Option<String>,

    /// Remote store backend: `directory` or `log`.
    #[arg(long, value_name = "KIND")]
    pub remote_kind: Option<RemoteKind>,

    /// Prefix prepended to every remote key.
    #[arg(long, value_name = "PREFIX")]
    pub remote_prefix: Option<String>,

    /// Full reconciliation interval, e.g. `5s`, `500ms`, `2m`.
    #[arg(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Maximum number of concurrent transfer jobs.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Glob (relative to the source root) to skip; may be repeated.
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DIRMIRROR_LOG`, then `[logging] level`, then `info`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Run a single reconciliation pass, wait for transfers, then exit.
    #[arg(long)]
    pub once: bool,

    /// Validate and print the effective configuration, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
