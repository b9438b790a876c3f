// src/watch/notifier.rs

use std::path::Path;

use anyhow::{Context, Result};
use notify::event::{AccessKind, AccessMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::engine::RuntimeEvent;

/// Registration side of the OS change notifier.
///
/// One non-recursive watch per directory: the [`WatchSet`] decides which
/// directories are registered, the notifier only executes that decision.
///
/// [`WatchSet`]: crate::watch::WatchSet
pub trait Notifier: Send {
    fn watch(&mut self, dir: &Path) -> Result<()>;
    fn unwatch(&mut self, dir: &Path) -> Result<()>;
}

/// Production notifier backed by `notify::RecommendedWatcher`.
///
/// Events and errors from the watcher thread are forwarded into the runtime
/// channel as [`RuntimeEvent::PathChanged`] / [`RuntimeEvent::NotifierError`].
/// Dropping this value stops all watches.
pub struct NotifyBackend {
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend").finish()
    }
}

impl NotifyBackend {
    pub fn new(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Result<Self> {
        // Closure called synchronously by notify whenever an event arrives.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                for event in runtime_events_from(res) {
                    if let Err(err) = runtime_tx.send(event) {
                        // Receiver is gone; the runtime is shutting down.
                        tracing::debug!("dropping notify event: {err}");
                        return;
                    }
                }
            },
            Config::default(),
        )
        .context("creating filesystem notifier")?;

        Ok(Self { inner })
    }
}

impl Notifier for NotifyBackend {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        self.inner
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {:?}", dir))
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        self.inner
            .unwatch(dir)
            .with_context(|| format!("unwatching {:?}", dir))
    }
}

/// Notifier that registers nothing, used for single-pass (`--once`) runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn watch(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    fn unwatch(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}

/// Translate one notify callback payload into runtime events.
///
/// Pure read access never changes content, so it is dropped here rather than
/// costing a hash later.
pub fn runtime_events_from(res: notify::Result<Event>) -> Vec<RuntimeEvent> {
    match res {
        Ok(event) => {
            let kind = event.kind;
            if !is_relevant(&kind) {
                return Vec::new();
            }
            event
                .paths
                .into_iter()
                .map(|path| RuntimeEvent::PathChanged { path, kind })
                .collect()
        }
        Err(err) => vec![RuntimeEvent::NotifierError(err.to_string())],
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Access(_) => false,
        _ => true,
    }
}
