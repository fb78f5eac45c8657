//! Exit signal shared between the launcher, the client and signal handlers.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One-shot, cloneable exit signal.
///
/// Any clone may fire it; every clone observes it.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    triggered: Mutex<bool>,
    cond: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal and wake every waiter.
    pub fn trigger(&self) {
        *self.lock() = true;
        self.inner.cond.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.lock()
    }

    /// Block until the signal fires.
    pub fn wait(&self) {
        let mut triggered = self.lock();
        while !*triggered {
            triggered = self
                .inner
                .cond
                .wait(triggered)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the signal fires or `timeout` elapses. Returns whether it fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let triggered = self.lock();
        let (triggered, _) = self
            .inner
            .cond
            .wait_timeout_while(triggered, timeout, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        *triggered
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
