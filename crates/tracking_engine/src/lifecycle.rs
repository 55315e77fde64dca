//! Stream lifecycle: exit requests and session teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

/// Shared stop signal for the scheduler thread and the session owner.
///
/// `request_exit` is a clean stop. `request_teardown` also records why the
/// session has to end; only the first reason is kept.
#[derive(Debug, Default)]
pub struct StreamLifecycle {
    exiting: AtomicBool,
    teardown: Mutex<Option<String>>,
}

impl StreamLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_exit(&self) {
        if !self.exiting.swap(true, Ordering::AcqRel) {
            info!("stream exit requested");
        }
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting.load(Ordering::Acquire)
    }

    /// Stop the stream and ask the session owner to tear the session down
    pub fn request_teardown(&self, reason: impl Into<String>) {
        let reason = reason.into();
        {
            let mut slot = self.teardown.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                warn!(reason = %reason, "session teardown requested");
                *slot = Some(reason);
            }
        }
        self.exiting.store(true, Ordering::Release);
    }

    /// Reason for teardown, if one was requested
    pub fn teardown_reason(&self) -> Option<String> {
        self.teardown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
