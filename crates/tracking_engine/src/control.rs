//! Peer control shared between the session thread and the scheduler.

use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::TrackingControl;

/// Latest `TrackingControl` received from the peer.
///
/// Writers replace the whole value; readers copy it out. A reader never sees
/// a mix of two messages.
#[derive(Debug, Default)]
pub struct SharedControlState {
    inner: Mutex<TrackingControl>,
}

impl SharedControlState {
    pub fn new(initial: TrackingControl) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    /// Replace the current control
    pub fn update(&self, control: TrackingControl) {
        *self.lock() = control;
    }

    /// Copy of the current control
    pub fn snapshot(&self) -> TrackingControl {
        *self.lock()
    }

    // The guarded value is `Copy` and written in one assignment, so a
    // poisoned lock still holds a whole message.
    fn lock(&self) -> MutexGuard<'_, TrackingControl> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
