// src/engine/mod.rs

//! Orchestration engine for dirmirror.
//!
//! This module ties together the two producers of work and their single
//! consumer:
//! - OS change notifications (push)
//! - the periodic rescan tick (pull)
//! - shutdown signals
//!
//! All of them arrive as [`RuntimeEvent`]s on one channel and are handled
//! by [`Runtime`]. The single-flight guard for full reconciliation passes
//! lives in [`rescan`].

use std::path::PathBuf;

use notify::EventKind;

/// Events flowing into the runtime from the notifier, the timer and signal
/// handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// The OS reported a change affecting `path`.
    PathChanged { path: PathBuf, kind: EventKind },
    /// The notifier backend reported an error. Logged, not fatal.
    NotifierError(String),
    /// The rescan interval elapsed.
    RescanTick,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod rescan;
pub mod runtime;

pub use rescan::{RescanFlag, RescanGuard};
pub use runtime::Runtime;
