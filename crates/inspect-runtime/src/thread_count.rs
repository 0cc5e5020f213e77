#![forbid(unsafe_code)]

//! Tracking of in-flight aggregation workers.
//!
//! Destructive editor commands (delete, undo) must not mutate selected
//! objects while a worker may be enumerating them. They ask
//! [`ThreadCounter::is_active`] first, or poll with
//! [`ThreadCounter::wait_until_idle`].
//!
//! The count is only touched under its mutex. It is incremented by
//! [`ThreadCounter::enter`] before a worker is spawned, and decremented when
//! the returned [`ActiveTask`] is dropped: on completion, on stale abort, on
//! panic, or when the spawn itself fails.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

/// Number of running aggregation workers.
#[derive(Debug, Default)]
pub struct ThreadCounter {
    count: Mutex<usize>,
}

impl ThreadCounter {
    /// Counter with no active workers.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a worker about to start.
    pub fn enter(self: &Arc<Self>) -> ActiveTask {
        *self.lock() += 1;
        ActiveTask {
            counter: Arc::clone(self),
        }
    }

    /// Number of running workers.
    pub fn active(&self) -> usize {
        *self.lock()
    }

    /// Whether any worker is running.
    pub fn is_active(&self) -> bool {
        self.active() > 0
    }

    /// Poll until no worker is running or `timeout` elapses.
    ///
    /// Sleeps `poll` between checks. Returns `true` once idle.
    pub fn wait_until_idle(&self, timeout: Duration, poll: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_active() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(poll.min(deadline - now));
        }
    }
}

/// Holds one slot in a [`ThreadCounter`] until dropped.
#[derive(Debug)]
#[must_use = "the worker is counted only while the guard is alive"]
pub struct ActiveTask {
    counter: Arc<ThreadCounter>,
}

impl Drop for ActiveTask {
    fn drop(&mut self) {
        let mut count = self.counter.lock();
        *count = count.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let counter = ThreadCounter::new();
        assert!(!counter.is_active());
        assert_eq!(counter.active(), 0);
    }

    #[test]
    fn guard_counts_while_alive() {
        let counter = ThreadCounter::new();
        let first = counter.enter();
        let second = counter.enter();
        assert_eq!(counter.active(), 2);
        drop(first);
        assert_eq!(counter.active(), 1);
        drop(second);
        assert!(!counter.is_active());
    }

    #[test]
    fn guard_released_on_panic() {
        let counter = ThreadCounter::new();
        let task = counter.enter();
        let handle = thread::spawn(move || {
            let _task = task;
            panic!("worker failed");
        });
        assert!(handle.join().is_err());
        assert!(!counter.is_active());
    }

    #[test]
    fn wait_until_idle_returns_when_worker_exits() {
        let counter = ThreadCounter::new();
        let task = counter.enter();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(task);
        });
        assert!(counter.wait_until_idle(Duration::from_secs(5), Duration::from_millis(1)));
        handle.join().unwrap();
    }

    #[test]
    fn wait_until_idle_times_out() {
        let counter = ThreadCounter::new();
        let _task = counter.enter();
        let start = Instant::now();
        assert!(!counter.wait_until_idle(Duration::from_millis(20), Duration::from_millis(5)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wait_until_idle_immediate_when_idle() {
        let counter = ThreadCounter::new();
        assert!(counter.wait_until_idle(Duration::ZERO, Duration::from_millis(5)));
    }
}
