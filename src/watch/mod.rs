// src/watch/mod.rs

//! Local side of the mirror: watching and change detection.
//!
//! This module is responsible for:
//! - Keeping one non-recursive OS watch per directory under the root
//!   ([`WatchSet`], [`Notifier`]).
//! - Remembering a content fingerprint per synced file ([`FingerprintMap`]).
//! - Deciding, per path, whether a Copy or Remove is needed
//!   ([`ChangeDetector`]) and reconciling whole subtrees ([`SubtreeWalker`]).
//!
//! It does **not** transfer anything; decided actions are handed to the
//! [`dispatch`](crate::dispatch) layer.

pub mod detector;
pub mod fingerprint;
pub mod notifier;
pub mod path_utils;
pub mod patterns;
pub mod state;
pub mod walker;
pub mod watch_set;

pub use detector::ChangeDetector;
pub use fingerprint::{compute_fingerprint, Fingerprint, FingerprintMap, FingerprintUpdate};
pub use notifier::{Notifier, NotifyBackend, NullNotifier};
pub use patterns::ExcludeSet;
pub use state::{SyncState, TrackedTree};
pub use walker::{SubtreeWalker, WalkReport};
pub use watch_set::WatchSet;
