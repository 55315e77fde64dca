//! Recenter latch.

use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot "reference space changed" notification.
///
/// Any number of triggers before the next `take` collapse into one.
#[derive(Debug, Default)]
pub struct RecenterLatch {
    pending: AtomicBool,
}

impl RecenterLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the reference space as changed
    pub fn trigger(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the pending notification, if any
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
