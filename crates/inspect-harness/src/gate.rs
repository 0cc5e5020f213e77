#![forbid(unsafe_code)]

//! A one-shot gate for holding worker threads at a known point.
//!
//! Hook [`Gate::pass`] into a [`MockObject`](crate::MockObject) enumeration,
//! wait for the worker to arrive with [`Gate::wait_for_arrivals`], change
//! state on the test thread, then [`Gate::open`] to let it continue.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Upper bound a thread blocks in [`Gate::pass`] before giving up.
pub const GATE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    arrivals: usize,
}

/// Closed until [`open`](Self::open) is called; stays open afterwards.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<GateState>, Condvar)>,
}

impl Gate {
    /// A closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Let every waiting and future thread through.
    pub fn open(&self) {
        self.lock().open = true;
        self.inner.1.notify_all();
    }

    /// Whether the gate has been opened.
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Number of threads that have reached the gate.
    pub fn arrivals(&self) -> usize {
        self.lock().arrivals
    }

    /// Record an arrival and block until the gate opens.
    ///
    /// Returns `false` if [`GATE_TIMEOUT`] passes first.
    pub fn pass(&self) -> bool {
        let (_, cvar) = &*self.inner;
        let mut state = self.lock();
        state.arrivals += 1;
        cvar.notify_all();

        let deadline = Instant::now() + GATE_TIMEOUT;
        while !state.open {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = cvar
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
        true
    }

    /// Block until at least `count` threads have reached the gate.
    ///
    /// Returns `false` on timeout.
    pub fn wait_for_arrivals(&self, count: usize, timeout: Duration) -> bool {
        let (_, cvar) = &*self.inner;
        let mut state = self.lock();
        let deadline = Instant::now() + timeout;
        while state.arrivals < count {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = cvar
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn holds_thread_until_opened() {
        let gate = Gate::new();
        let waiter = gate.clone();
        let handle = thread::spawn(move || waiter.pass());

        assert!(gate.wait_for_arrivals(1, Duration::from_secs(5)));
        assert!(!gate.is_open());
        gate.open();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn open_gate_passes_immediately() {
        let gate = Gate::new();
        gate.open();
        assert!(gate.pass());
        assert_eq!(gate.arrivals(), 1);
    }

    #[test]
    fn arrivals_wait_times_out() {
        let gate = Gate::new();
        assert!(!gate.wait_for_arrivals(1, Duration::from_millis(10)));
    }
}
