//! Single-submission guard for user-triggered requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Blocks a second submission while one is outstanding.
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of a request; releases the guard on drop.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the ticket is dropped"]
pub struct InFlightTicket {
    busy: Arc<AtomicBool>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` if a request is already in flight
    pub fn try_begin(&self) -> Option<InFlightTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
