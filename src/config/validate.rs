// src/config/validate.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{MirrorError, Result};
use crate::logging::parse_level_str;
use crate::types::RemoteKind;
use crate::watch::ExcludeSet;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MirrorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let root = validate_root(raw.source.root.as_deref())?;

        let excludes = ExcludeSet::new(&raw.source.exclude)
            .map_err(|e| config_error(format!("[source].exclude: {e:#}")))?;

        let rescan_interval = parse_duration(&raw.sync.rescan_interval)
            .map_err(|e| config_error(format!("[sync].rescan_interval: {e}")))?;
        if rescan_interval.is_zero() {
            return Err(config_error("[sync].rescan_interval must be greater than zero"));
        }
        if rescan_interval > MAX_RESCAN_INTERVAL {
            return Err(config_error(format!(
                "[sync].rescan_interval must be at most {}h",
                MAX_RESCAN_INTERVAL.as_secs() / 3600
            )));
        }

        let workers = match raw.sync.workers {
            Some(0) => return Err(config_error("[sync].workers must be >= 1 (got 0)")),
            Some(n) => n,
            None => default_workers(),
        };

        let destination =
            validate_destination(raw.remote.kind, raw.remote.destination.as_deref(), &root)?;

        if let Some(level) = raw.logging.level.as_deref() {
            if parse_level_str(level).is_none() {
                return Err(config_error(format!(
                    "[logging].level: unknown level '{level}'; \
                     expected error, warn, info, debug or trace"
                )));
            }
        }

        Ok(ConfigFile {
            root,
            excludes,
            remote_kind: raw.remote.kind,
            destination,
            remote_prefix: raw.remote.prefix,
            rescan_interval,
            workers,
            logging: raw.logging,
        })
    }
}

fn config_error(msg: impl Into<String>) -> MirrorError {
    MirrorError::ConfigError(msg.into())
}

fn validate_root(root: Option<&Path>) -> Result<PathBuf> {
    let Some(root) = root else {
        return Err(config_error(
            "no source directory given; set [source].root or pass --src",
        ));
    };
    if !root.is_dir() {
        return Err(config_error(format!(
            "source directory {:?} does not exist or is not a directory",
            root
        )));
    }
    root.canonicalize()
        .map_err(|e| config_error(format!("resolving source directory {:?}: {e}", root)))
}

fn validate_destination(
    kind: RemoteKind,
    destination: Option<&Path>,
    root: &Path,
) -> Result<Option<PathBuf>> {
    let Some(dest) = destination else {
        return match kind {
            RemoteKind::Directory => Err(config_error(
                "remote kind \"directory\" requires [remote].destination or --dest",
            )),
            RemoteKind::Log => Ok(None),
        };
    };

    let abs = match dest.canonicalize() {
        Ok(p) => p,
        Err(_) => std::path::absolute(dest)
            .map_err(|e| config_error(format!("resolving destination {:?}: {e}", dest)))?,
    };

    if kind == RemoteKind::Directory {
        if abs.exists() && !abs.is_dir() {
            return Err(config_error(format!(
                "destination {:?} exists and is not a directory",
                abs
            )));
        }
        // Mirroring into the watched tree would feed our own writes back in.
        if abs.starts_with(root) {
            return Err(config_error(format!(
                "destination {:?} must not be inside the source directory {:?}",
                abs, root
            )));
        }
    }

    Ok(Some(abs))
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Parse durations like `500ms`, `5s`, `2m`, `1h`.
/// Longest accepted rescan interval (one week).
pub const MAX_RESCAN_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix (ms, s, m, h)"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;

    let secs_per_unit = match unit_part.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
