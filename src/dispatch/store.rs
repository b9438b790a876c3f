// src/dispatch/store.rs

//! Remote store abstraction.
//!
//! Worker jobs talk to a `RemoteStore` instead of a concrete client, so the
//! backend can be swapped (and faked in tests) without touching the pool.
//!
//! - [`DirectoryStore`] mirrors into a directory, e.g. a mounted share.
//! - [`LogStore`] only logs what would be transferred.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::types::RemoteKind;

pub type StoreFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Upload/delete interface of the remote side.
///
/// Keys are `/`-separated and already carry the configured prefix.
pub trait RemoteStore: Send + Sync {
    /// Copy the local file at `local` to `key`, replacing any previous object.
    fn upload<'a>(&'a self, local: &'a Path, key: &'a str) -> StoreFuture<'a>;

    /// Delete `key`. Deleting a missing key succeeds.
    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Mirror into a destination directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    base: PathBuf,
    name: String,
}

impl DirectoryStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let name = format!("directory:{}", base.display());
        Self { base, name }
    }

    pub fn resolve(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|seg| !seg.is_empty())
            .fold(self.base.clone(), |acc, seg| acc.join(seg))
    }

    /// Delete mirrored files standing where `dir` needs a directory, i.e. a
    /// local file that has since been replaced by a directory.
    async fn clear_file_ancestors(&self, dir: &Path) -> Result<()> {
        let mut ancestors: Vec<&Path> = dir
            .ancestors()
            .take_while(|p| *p != self.base.as_path())
            .collect();
        ancestors.reverse();
        for path in ancestors {
            if let Ok(meta) = fs::symlink_metadata(path).await {
                if !meta.is_dir() {
                    debug!(path = %path.display(), "replacing mirrored file with directory");
                    fs::remove_file(path)
                        .await
                        .with_context(|| format!("removing {:?}", path))?;
                }
            }
        }
        Ok(())
    }
}

fn temp_sibling(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.dirmirror-tmp"))
}

impl RemoteStore for DirectoryStore {
    fn upload<'a>(&'a self, local: &'a Path, key: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            let dest = self.resolve(key);
            if let Some(parent) = dest.parent() {
                if fs::create_dir_all(parent).await.is_err() {
                    self.clear_file_ancestors(parent).await?;
                    fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("creating directory {:?}", parent))?;
                }
            }

            // Write next to the target, then rename, so readers of the
            // mirror never see a half-copied file.
            let tmp = temp_sibling(&dest);
            if let Err(err) = fs::copy(local, &tmp).await {
                let _ = fs::remove_file(&tmp).await;
                return Err(err).with_context(|| format!("copying {:?} to {:?}", local, tmp));
            }
            if let Ok(meta) = fs::symlink_metadata(&dest).await {
                if meta.is_dir() {
                    debug!(key, "replacing mirrored directory with file");
                    fs::remove_dir_all(&dest)
                        .await
                        .with_context(|| format!("removing directory {:?}", dest))?;
                }
            }
            fs::rename(&tmp, &dest)
                .await
                .with_context(|| format!("renaming {:?} to {:?}", tmp, dest))?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            let dest = self.resolve(key);
            match fs::symlink_metadata(&dest).await {
                Ok(meta) if meta.is_dir() => {
                    // A local directory took this key's place and has already
                    // been mirrored over it.
                    debug!(key, "remote key is now a directory; leaving it");
                    return Ok(());
                }
                Ok(_) => {}
                Err(err)
                    if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) =>
                {
                    debug!(key, "remote object already absent");
                    return Ok(());
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("inspecting {:?}", dest));
                }
            }

            match fs::remove_file(&dest).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!(key, "remote object already absent");
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("removing {:?}", dest));
                }
            }

            let still_there = fs::try_exists(&dest)
                .await
                .with_context(|| format!("confirming removal of {:?}", dest))?;
            if still_there {
                bail!("{:?} still exists after delete", dest);
            }
            Ok(())
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Backend that performs no transfer and only logs the intent.
#[derive(Debug, Clone, Default)]
pub struct LogStore;

impl RemoteStore for LogStore {
    fn upload<'a>(&'a self, local: &'a Path, key: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            info!(local = %local.display(), key, "upload (log only)");
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            info!(key, "delete (log only)");
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Build the configured backend.
pub fn build_store(cfg: &ConfigFile) -> Result<Arc<dyn RemoteStore>> {
    match cfg.remote_kind {
        RemoteKind::Directory => {
            let Some(dest) = cfg.destination.as_ref() else {
                bail!("remote kind \"directory\" requires a destination");
            };
            info!(destination = %dest.display(), "using directory remote store");
            Ok(Arc::new(DirectoryStore::new(dest.clone())))
        }
        RemoteKind::Log => {
            info!("using log-only remote store");
            Ok(Arc::new(LogStore))
        }
    }
}
