use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// What should happen to the remote counterpart of a local path.
///
/// This is a closed set: the worker pool matches on it exhaustively to pick
/// the upload or delete handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Copy,
    Remove,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Copy => f.write_str("copy"),
            ActionKind::Remove => f.write_str("remove"),
        }
    }
}

/// A decided transfer intent for a single local path.
///
/// Created by the change detector, consumed exactly once by the worker pool.
/// It is an intent only: nothing has been transferred yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub path: PathBuf,
    pub kind: ActionKind,
}

impl Action {
    pub fn copy(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ActionKind::Copy,
        }
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ActionKind::Remove,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Which remote store backend receives the dispatched actions.
///
/// - `Directory`: mirror into a destination directory on a mounted
///   filesystem (default).
/// - `Log`: only log what would be transferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    #[default]
    Directory,
    Log,
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteKind::Directory => f.write_str("directory"),
            RemoteKind::Log => f.write_str("log"),
        }
    }
}

impl FromStr for RemoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "directory" | "dir" => Ok(RemoteKind::Directory),
            "log" => Ok(RemoteKind::Log),
            other => Err(format!(
                "invalid remote kind: {other} (expected \"directory\" or \"log\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_kind_parses_case_insensitively() {
        assert_eq!("Directory".parse::<RemoteKind>(), Ok(RemoteKind::Directory));
        assert_eq!(" log ".parse::<RemoteKind>(), Ok(RemoteKind::Log));
        assert!("s3".parse::<RemoteKind>().is_err());
    }

    #[test]
    fn action_constructors_set_kind() {
        assert_eq!(Action::copy("a.txt").kind, ActionKind::Copy);
        assert_eq!(Action::remove("a.txt").kind, ActionKind::Remove);
        assert_eq!(ActionKind::Remove.to_string(), "remove");
    }
}
