// tests/mirror_scenarios.rs

mod common;
use crate::common::{copy, remove, Harness};

#[test]
fn initial_walk_copies_once_and_rewalk_is_silent() {
    let mut h = Harness::new();
    h.write("a.txt", "x");

    h.detector.reconcile();
    assert_eq!(h.take_actions(), vec![copy("a.txt")]);

    h.detector.reconcile();
    assert!(h.take_actions().is_empty());
}

#[test]
fn modified_file_is_copied_once_with_new_fingerprint() {
    let mut h = Harness::new();
    h.write("a.txt", "x");
    h.detector.reconcile();
    h.take_actions();
    let before = h.detector.state().fingerprint_of(&h.path("a.txt")).unwrap();

    h.write("a.txt", "y");
    h.notify("a.txt");
    h.notify("a.txt");

    assert_eq!(h.take_actions(), vec![copy("a.txt")]);
    let after = h.detector.state().fingerprint_of(&h.path("a.txt")).unwrap();
    assert_ne!(before, after);
    assert_eq!(after.to_hex(), blake3::hash(b"y").to_hex().to_string());
}

#[test]
fn new_directory_is_registered_and_its_files_copied() {
    let mut h = Harness::new();
    h.detector.reconcile();

    h.write("sub/b.txt", "b");
    h.notify("sub");

    assert!(h.is_watched("sub"));
    assert!(h.notifier.watched().contains(&h.path("sub")));
    assert_eq!(h.take_actions(), vec![copy("sub/b.txt")]);
}

#[test]
fn deleted_directory_is_deregistered_then_swept() {
    let mut h = Harness::new();
    h.write("sub/b.txt", "b");
    h.write("sub/deeper/c.txt", "c");
    h.detector.reconcile();
    h.take_actions();

    h.remove("sub");
    h.notify("sub");

    // No action for the directory itself; descendants are stale for now.
    assert!(h.take_actions().is_empty());
    assert!(!h.is_watched("sub"));
    assert!(!h.is_watched("sub/deeper"));
    assert!(h.notifier.unwatched().contains(&h.path("sub/deeper")));
    assert!(h.detector.state().fingerprint_of(&h.path("sub/b.txt")).is_some());

    h.detector.reconcile();
    assert_eq!(
        h.take_actions(),
        vec![remove("sub/b.txt"), remove("sub/deeper/c.txt")]
    );
    assert_eq!(h.detector.state().tracked_files(), 0);
}

#[test]
fn deleted_file_emits_single_remove() {
    let mut h = Harness::new();
    h.write("a.txt", "x");
    h.detector.reconcile();
    h.take_actions();

    h.remove("a.txt");
    h.notify("a.txt");
    h.notify("a.txt");

    assert_eq!(h.take_actions(), vec![remove("a.txt")]);
    assert!(h.detector.state().fingerprint_of(&h.path("a.txt")).is_none());
}

#[test]
fn excluded_paths_are_never_watched_or_copied() {
    let mut h = Harness::with_excludes(&[".git", "**/*.swp"]);
    h.write(".git/HEAD", "ref");
    h.write("notes.txt.swp", "tmp");
    h.write("notes.txt", "keep");

    h.detector.reconcile();
    h.notify(".git/HEAD");

    assert_eq!(h.take_actions(), vec![copy("notes.txt")]);
    assert!(!h.is_watched(".git"));
}

#[test]
fn rejected_watch_is_retried_on_next_pass() {
    let mut h = Harness::new();
    h.mkdir("flaky");
    h.notifier.reject(h.path("flaky"));

    h.detector.reconcile();
    assert!(!h.is_watched("flaky"));

    h.notifier.accept(h.path("flaky"));
    h.detector.reconcile();
    assert!(h.is_watched("flaky"));
    assert!(h.take_actions().is_empty());
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed() {
    let mut h = Harness::new();
    h.write("real/a.txt", "a");
    std::os::unix::fs::symlink(h.path("real"), h.path("loop")).unwrap();

    h.detector.reconcile();

    assert!(h.is_watched("real"));
    assert!(!h.is_watched("loop"));
    assert_eq!(h.take_actions(), vec![copy("real/a.txt")]);
}

#[test]
fn file_replaced_by_directory_settles_after_notification() {
    let mut h = Harness::new();
    h.write("x", "old");
    h.detector.reconcile();
    h.take_actions();

    h.remove("x");
    h.write("x/child.txt", "c");
    h.notify("x");

    assert_eq!(h.take_actions(), vec![remove("x"), copy("x/child.txt")]);
    assert!(h.is_watched("x"));
    assert!(h.detector.state().fingerprint_of(&h.path("x")).is_none());

    h.detector.reconcile();
    assert!(h.take_actions().is_empty());
}

#[test]
fn directory_replaced_by_file_settles_after_rescan() {
    let mut h = Harness::new();
    h.write("x/child.txt", "c");
    h.write("x/deep/d.txt", "d");
    h.detector.reconcile();
    h.take_actions();

    h.remove("x");
    h.write("x", "now a file");
    h.detector.reconcile();

    assert_eq!(
        h.take_actions(),
        vec![remove("x/child.txt"), remove("x/deep/d.txt"), copy("x")]
    );
    assert!(!h.is_watched("x"));
    assert!(!h.is_watched("x/deep"));
    assert_eq!(h.detector.state().tracked_files(), 1);
}
