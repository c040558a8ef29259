//! In-flight connection accounting
//!
//! A counter paired with a condvar so the supervisor can block until every
//! handler has returned.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Counts live connection handlers
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: Mutex<usize>,
    idle: Condvar,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; the count drops when the guard is dropped
    pub fn enter(self: &Arc<Self>) -> ConnectionGuard {
        *self.active.lock() += 1;
        ConnectionGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Number of live handlers
    pub fn active(&self) -> usize {
        *self.active.lock()
    }

    /// Block until no handler is live
    pub fn wait_idle(&self) {
        let mut active = self.active.lock();
        while *active > 0 {
            self.idle.wait(&mut active);
        }
    }

    /// Block until no handler is live or `timeout` passes; returns whether idle
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let mut active = self.active.lock();
        while *active > 0 {
            if self.idle.wait_for(&mut active, timeout).timed_out() {
                return *active == 0;
            }
        }
        true
    }

    fn leave(&self) {
        let mut active = self.active.lock();
        *active -= 1;
        if *active == 0 {
            self.idle.notify_all();
        }
    }
}

/// Marks one live handler
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}
