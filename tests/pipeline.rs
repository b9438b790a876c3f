// tests/pipeline.rs

mod common;
use crate::common::{init_tracing, with_timeout, RecordingStore};

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{EventKind, ModifyKind, RemoveKind};
use tokio::sync::mpsc;

use dirmirror::cli::CliArgs;
use dirmirror::dispatch::{ActionDispatcher, RemoteKeys, WorkerPool};
use dirmirror::engine::{Runtime, RuntimeEvent};
use dirmirror::fs::RealFileSystem;
use dirmirror::types::ActionKind;
use dirmirror::watch::{ChangeDetector, ExcludeSet, NullNotifier, SyncState};
use dirmirror_test_utils::builders::ConfigFileBuilder;

async fn wait_until(mut ready: impl FnMut() -> bool) {
    with_timeout(async {
        while !ready() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn once_mode_mirrors_tree_into_destination() {
    init_tracing();
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "alpha").unwrap();
    fs::create_dir_all(src.path().join("sub/deep")).unwrap();
    fs::write(src.path().join("sub/deep/b.txt"), "beta").unwrap();
    fs::write(src.path().join("skip.tmp"), "nope").unwrap();

    let cfg = ConfigFileBuilder::new(src.path(), dst.path())
        .with_prefix("backup")
        .with_exclude("*.tmp")
        .with_workers(2)
        .build();
    let args = CliArgs {
        once: true,
        ..Default::default()
    };

    with_timeout(dirmirror::run(args, cfg)).await.unwrap();

    let out = dst.path().join("backup");
    assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "alpha");
    assert_eq!(fs::read_to_string(out.join("sub/deep/b.txt")).unwrap(), "beta");
    assert!(!out.join("skip.tmp").exists());
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "alpha").unwrap();

    let cfg = ConfigFileBuilder::new(src.path(), dst.path()).build();
    let args = CliArgs {
        dry_run: true,
        ..Default::default()
    };

    dirmirror::run(args, cfg).await.unwrap();
    assert_eq!(fs::read_dir(dst.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn runtime_events_flow_through_pool_to_store() {
    init_tracing();
    let src = tempfile::tempdir().unwrap();
    let root = src.path().canonicalize().unwrap();
    fs::write(root.join("a.txt"), "v1").unwrap();

    let store = RecordingStore::new();
    let (dispatcher, action_rx) = ActionDispatcher::channel();
    let pool = WorkerPool::spawn(
        action_rx,
        Arc::new(store.clone()),
        RemoteKeys::new(root.clone(), "p"),
        4,
    );
    let detector = Arc::new(ChangeDetector::new(
        Arc::new(RealFileSystem),
        Arc::new(SyncState::new(Box::new(NullNotifier))),
        dispatcher,
        root.clone(),
        ExcludeSet::default(),
    ));

    let (tx, rx) = mpsc::unbounded_channel();
    let runtime = Runtime::new(Arc::clone(&detector), rx, std::time::Duration::from_secs(3600));
    runtime.reconcile_now().await.unwrap();
    wait_until(|| !store.ops().is_empty()).await;

    fs::write(root.join("a.txt"), "v2").unwrap();
    tx.send(RuntimeEvent::PathChanged {
        path: root.join("a.txt"),
        kind: EventKind::Modify(ModifyKind::Any),
    })
    .unwrap();
    fs::remove_file(root.join("a.txt")).unwrap();
    tx.send(RuntimeEvent::PathChanged {
        path: root.join("a.txt"),
        kind: EventKind::Remove(RemoveKind::File),
    })
    .unwrap();
    tx.send(RuntimeEvent::ShutdownRequested).unwrap();

    with_timeout(runtime.run()).await.unwrap();
    drop(detector);
    with_timeout(pool.join()).await;

    // By the time the modify event is handled the file is already gone, so
    // both events collapse into a single Remove.
    assert_eq!(
        store.keys(),
        vec![
            (ActionKind::Copy, "p/a.txt".to_string()),
            (ActionKind::Remove, "p/a.txt".to_string()),
        ]
    );
    assert_eq!(store.ops()[0].contents.as_deref(), Some(&b"v1"[..]));
}

#[tokio::test]
async fn directory_removal_mirrors_after_rescan() {
    init_tracing();
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let root = src.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("sub/b.txt"), "b").unwrap();

    let store = Arc::new(dirmirror::dispatch::DirectoryStore::new(dst.path()));
    let (dispatcher, action_rx) = ActionDispatcher::channel();
    let pool = WorkerPool::spawn(action_rx, store, RemoteKeys::new(root.clone(), ""), 2);
    let detector = Arc::new(ChangeDetector::new(
        Arc::new(RealFileSystem),
        Arc::new(SyncState::new(Box::new(NullNotifier))),
        dispatcher,
        root.clone(),
        ExcludeSet::default(),
    ));

    let (tx, rx) = mpsc::unbounded_channel();
    let runtime = Runtime::new(Arc::clone(&detector), rx, std::time::Duration::from_secs(3600));
    runtime.reconcile_now().await.unwrap();
    let mirrored: PathBuf = dst.path().join("sub").join("b.txt");
    wait_until(|| mirrored.exists()).await;

    fs::remove_dir_all(root.join("sub")).unwrap();
    tx.send(RuntimeEvent::PathChanged {
        path: root.join("sub"),
        kind: EventKind::Remove(RemoveKind::Folder),
    })
    .unwrap();
    tx.send(RuntimeEvent::RescanTick).unwrap();
    tx.send(RuntimeEvent::ShutdownRequested).unwrap();

    with_timeout(runtime.run()).await.unwrap();
    drop(detector);
    with_timeout(pool.join()).await;

    assert!(!mirrored.exists());
}

#[tokio::test]
async fn replaced_paths_converge_in_destination() {
    init_tracing();
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let root = src.path().canonicalize().unwrap();
    fs::write(root.join("x"), "file x").unwrap();
    fs::create_dir_all(root.join("y/inner")).unwrap();
    fs::write(root.join("y/inner/c.txt"), "c").unwrap();

    let store = Arc::new(dirmirror::dispatch::DirectoryStore::new(dst.path()));
    let (dispatcher, action_rx) = ActionDispatcher::channel();
    let pool = WorkerPool::spawn(action_rx, store, RemoteKeys::new(root.clone(), ""), 4);
    let detector = Arc::new(ChangeDetector::new(
        Arc::new(RealFileSystem),
        Arc::new(SyncState::new(Box::new(NullNotifier))),
        dispatcher,
        root.clone(),
        ExcludeSet::default(),
    ));

    let (_tx, rx) = mpsc::unbounded_channel();
    let runtime = Runtime::new(Arc::clone(&detector), rx, std::time::Duration::from_secs(3600));
    runtime.reconcile_now().await.unwrap();
    let first_x = dst.path().join("x");
    let first_c = dst.path().join("y/inner/c.txt");
    wait_until(|| first_x.is_file() && first_c.is_file()).await;

    fs::remove_file(root.join("x")).unwrap();
    fs::create_dir_all(root.join("x")).unwrap();
    fs::write(root.join("x/child.txt"), "child").unwrap();
    fs::remove_dir_all(root.join("y")).unwrap();
    fs::write(root.join("y"), "file y").unwrap();

    runtime.reconcile_now().await.unwrap();
    drop(runtime);
    drop(detector);
    with_timeout(pool.join()).await;

    assert_eq!(
        fs::read_to_string(dst.path().join("x/child.txt")).unwrap(),
        "child"
    );
    assert_eq!(fs::read_to_string(dst.path().join("y")).unwrap(), "file y");
}
