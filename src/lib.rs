// src/lib.rs

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::dispatch::{build_store, ActionDispatcher, RemoteKeys, WorkerPool};
use crate::engine::{Runtime, RuntimeEvent};
use crate::errors::Result;
use crate::fs::RealFileSystem;
use crate::watch::{ChangeDetector, Notifier, NotifyBackend, NullNotifier, SyncState};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the remote store and worker pool
/// - the shared watch state and change detector
/// - the OS notifier (disabled in `--once` mode)
/// - the runtime loop and Ctrl-C handling
///
/// An initial reconciliation always runs before the loop starts. On exit
/// the worker pool is drained, so every dispatched action has been
/// attempted before this returns.
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let store = build_store(&cfg)?;
    let (dispatcher, action_rx) = ActionDispatcher::channel();
    let pool = WorkerPool::spawn(
        action_rx,
        store,
        RemoteKeys::new(cfg.root.clone(), cfg.remote_prefix.clone()),
        cfg.workers,
    );

    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    let notifier: Box<dyn Notifier> = if args.once {
        Box::new(NullNotifier)
    } else {
        Box::new(NotifyBackend::new(rt_tx.clone())?)
    };

    let state = Arc::new(SyncState::new(notifier));
    let detector = Arc::new(ChangeDetector::new(
        Arc::new(RealFileSystem),
        state,
        dispatcher,
        cfg.root.clone(),
        cfg.excludes.clone(),
    ));

    let runtime = Runtime::new(Arc::clone(&detector), rt_rx, cfg.rescan_interval);

    if let Some(report) = runtime.reconcile_now().await {
        info!(
            root = %cfg.root.display(),
            dirs = report.dirs_visited,
            files = report.files_visited,
            actions = report.actions,
            errors = report.errors,
            "initial reconciliation finished"
        );
    }

    if args.once {
        // The detector owns the last dispatcher; dropping it closes the
        // action channel so the pool can drain and finish.
        drop(runtime);
        drop(detector);
        pool.join().await;
        info!("single pass complete");
        return Ok(());
    }

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested);
        });
    }
    drop(rt_tx);

    runtime.run().await?;

    debug!("stopping watches and draining worker pool");
    drop(detector);
    pool.join().await;
    Ok(())
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("dirmirror dry-run");
    println!("  source.root = {}", cfg.root.display());
    if !cfg.excludes.patterns().is_empty() {
        println!("  source.exclude = {:?}", cfg.excludes.patterns());
    }
    println!("  remote.kind = {}", cfg.remote_kind);
    if let Some(dest) = &cfg.destination {
        println!("  remote.destination = {}", dest.display());
    }
    if !cfg.remote_prefix.is_empty() {
        println!("  remote.prefix = {}", cfg.remote_prefix);
    }
    println!("  sync.rescan_interval = {:?}", cfg.rescan_interval);
    println!("  sync.workers = {}", cfg.workers);

    debug!("dry-run complete (nothing watched or transferred)");
}
