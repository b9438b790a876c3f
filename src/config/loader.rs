// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{MirrorError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] or [`load_effective`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        MirrorError::ConfigError(format!("reading config file {:?}: {e}", path))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it as-is.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Config file used when `--config` is not given: `Dirmirror.toml` in the
/// current working directory, if present.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dirmirror.toml")
}

/// Overlay command-line flags onto a raw config. Flags win.
pub fn apply_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(src) = &args.src {
        raw.source.root = Some(src.clone());
    }
    if !args.exclude.is_empty() {
        raw.source.exclude.extend(args.exclude.iter().cloned());
    }
    if let Some(kind) = args.remote_kind {
        raw.remote.kind = kind;
    }
    if let Some(dest) = &args.dest {
        raw.remote.destination = Some(PathBuf::from(dest));
    }
    if let Some(prefix) = &args.remote_prefix {
        raw.remote.prefix = prefix.clone();
    }
    if let Some(interval) = &args.interval {
        raw.sync.rescan_interval = interval.clone();
    }
    if let Some(workers) = args.workers {
        raw.sync.workers = Some(workers);
    }
}

/// Resolve the effective configuration: optional file, then flags, then
/// validation.
///
/// An explicit `--config` that cannot be read is an error; a missing
/// default `Dirmirror.toml` is not.
pub fn load_effective(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let default = default_config_path();
            if default.is_file() {
                debug!(path = %default.display(), "using default config file");
                load_from_path(&default)?
            } else {
                RawConfigFile::default()
            }
        }
    };

    apply_overrides(&mut raw, args);
    ConfigFile::try_from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RemoteKind;
    use std::time::Duration;

    #[test]
    fn file_values_are_loaded_and_flags_override_them() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let other_dst = tempfile::tempdir().unwrap();
        let cfg_dir = tempfile::tempdir().unwrap();
        let cfg_path = cfg_dir.path().join("Dirmirror.toml");
        fs::write(
            &cfg_path,
            format!(
                r#"
[source]
root = {src:?}
exclude = [".git"]

[remote]
kind = "directory"
destination = {dst:?}
prefix = "file-prefix"

[sync]
rescan_interval = "10s"
workers = 2
"#,
                src = src.path(),
                dst = dst.path(),
            ),
        )
        .unwrap();

        let args = CliArgs {
            config: Some(cfg_path),
            dest: Some(other_dst.path().display().to_string()),
            interval: Some("250ms".into()),
            exclude: vec!["*.swp".into()],
            ..Default::default()
        };
        let cfg = load_effective(&args).unwrap();

        assert_eq!(cfg.remote_kind, RemoteKind::Directory);
        assert_eq!(
            cfg.destination,
            Some(other_dst.path().canonicalize().unwrap())
        );
        assert_eq!(cfg.remote_prefix, "file-prefix");
        assert_eq!(cfg.rescan_interval, Duration::from_millis(250));
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.excludes.patterns(), [".git", "*.swp"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[source]\nroot = \"/tmp\"\nrecursive = true\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, MirrorError::TomlError(_)));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let args = CliArgs {
            config: Some(PathBuf::from("/definitely/missing/Dirmirror.toml")),
            ..Default::default()
        };
        let err = load_effective(&args).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
