// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::MAX_RESCAN_INTERVAL;
use crate::errors::Result;
use crate::watch::{ChangeDetector, WalkReport};

use super::rescan::RescanFlag;
use super::RuntimeEvent;

/// Drives change detection in response to `RuntimeEvent`s and the rescan
/// timer.
///
/// Notifications are handled one at a time, in arrival order, on the
/// blocking pool (hashing does file IO). Full rescans run concurrently
/// with notification handling but never with each other.
pub struct Runtime {
    detector: Arc<ChangeDetector>,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    rescan_interval: Duration,
    rescan: RescanFlag,
    in_flight: Option<JoinHandle<()>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("root", &self.detector.root())
            .field("rescan_interval", &self.rescan_interval)
            .field("rescan_running", &self.rescan.is_running())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// `rescan_interval` is clamped to [`MAX_RESCAN_INTERVAL`].
    pub fn new(
        detector: Arc<ChangeDetector>,
        event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        rescan_interval: Duration,
    ) -> Self {
        Self {
            detector,
            event_rx,
            rescan_interval: rescan_interval.min(MAX_RESCAN_INTERVAL),
            rescan: RescanFlag::new(),
            in_flight: None,
        }
    }

    pub fn rescan_flag(&self) -> RescanFlag {
        self.rescan.clone()
    }

    /// Start a full reconciliation on the blocking pool.
    ///
    /// Returns `None` (and starts nothing) if a pass is already running.
    pub fn trigger_rescan(&self) -> Option<JoinHandle<WalkReport>> {
        let Some(guard) = self.rescan.try_begin() else {
            debug!("rescan already in flight; dropping tick");
            return None;
        };
        let detector = Arc::clone(&self.detector);
        Some(tokio::task::spawn_blocking(move || {
            let _guard = guard;
            detector.reconcile()
        }))
    }

    /// Run one reconciliation pass and wait for it.
    pub async fn reconcile_now(&self) -> Option<WalkReport> {
        let handle = self.trigger_rescan()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(err) => {
                error!(error = %err, "reconciliation pass panicked");
                None
            }
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Ticks the rescan timer (first tick one interval after start; the
    ///   caller runs the initial pass).
    /// - Exits on `ShutdownRequested` or when every sender is gone, after
    ///   waiting for a rescan that is still running.
    pub async fn run(mut self) -> Result<()> {
        info!(
            root = %self.detector.root().display(),
            interval = ?self.rescan_interval,
            "dirmirror runtime started"
        );

        let mut ticker = interval_at(Instant::now() + self.rescan_interval, self.rescan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                maybe = self.event_rx.recv() => match maybe {
                    Some(e) => e,
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                },
                _ = ticker.tick() => RuntimeEvent::RescanTick,
            };

            if !self.handle_event(event).await {
                break;
            }
        }

        if let Some(pass) = self.in_flight.take() {
            debug!("waiting for in-flight rescan before exit");
            let _ = pass.await;
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Returns false when the loop should stop.
    async fn handle_event(&mut self, event: RuntimeEvent) -> bool {
        match event {
            RuntimeEvent::PathChanged { path, kind } => {
                debug!(path = %path.display(), ?kind, "change notification");
                let detector = Arc::clone(&self.detector);
                let res =
                    tokio::task::spawn_blocking(move || detector.handle_notification(&path)).await;
                if let Err(err) = res {
                    error!(error = %err, "change handler panicked");
                }
            }
            RuntimeEvent::NotifierError(msg) => {
                error!(error = %msg, "notifier reported an error");
            }
            RuntimeEvent::RescanTick => {
                if let Some(handle) = self.trigger_rescan() {
                    self.in_flight = Some(tokio::spawn(async move {
                        match handle.await {
                            Ok(report) => debug!(?report, "periodic rescan finished"),
                            Err(err) => error!(error = %err, "periodic rescan panicked"),
                        }
                    }));
                }
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested; stopping runtime");
                return false;
            }
        }
        true
    }
}
