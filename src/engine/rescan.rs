// src/engine/rescan.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-flight flag for full reconciliation passes.
///
/// Clones share the same flag. At most one [`RescanGuard`] exists at a
/// time; the flag clears when the guard drops, including during a panic
/// unwind inside the pass.
#[derive(Debug, Clone, Default)]
pub struct RescanFlag {
    running: Arc<AtomicBool>,
}

impl RescanFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag, or `None` if a pass is already in flight.
    pub fn try_begin(&self) -> Option<RescanGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RescanGuard {
                running: Arc::clone(&self.running),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct RescanGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RescanGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
