//! Reentrancy detection for change-notification dispatch.
//!
//! The monitor is not a lock: it never blocks. It turns a mutation attempted
//! from inside a dispatch into an explicit [`CollectionError::ReentrancyViolation`].

use std::cell::Cell;

use crate::domain::error::{CollectionError, CollectionResult};

/// Per-sequence flag, busy while the sequence dispatches a notification.
#[derive(Debug, Default)]
pub struct ReentrancyMonitor {
    busy: Cell<bool>,
}

impl ReentrancyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Marks the monitor busy until the returned guard is dropped.
    ///
    /// The guard restores the previous state on drop, unwinding included.
    pub fn enter(&self) -> DispatchGuard<'_> {
        let previous = self.busy.replace(true);
        DispatchGuard {
            monitor: self,
            previous,
        }
    }

    /// Fails if a dispatch is in progress.
    pub fn check(&self) -> CollectionResult<()> {
        if self.is_busy() {
            return Err(CollectionError::ReentrancyViolation);
        }
        Ok(())
    }
}

/// Keeps a [`ReentrancyMonitor`] busy for its lifetime.
#[must_use = "the monitor is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DispatchGuard<'a> {
    monitor: &'a ReentrancyMonitor,
    previous: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.monitor.busy.set(self.previous);
    }
}
