#![forbid(unsafe_code)]

//! Generation ids and cooperative staleness checks.
//!
//! Every selection or mode change bumps the manager's [`GenerationCounter`]
//! on the owning thread. A worker receives a [`GenerationToken`]: the id it
//! was started for plus a read-only view of the live counter. The worker
//! polls [`GenerationToken::checkpoint`] between steps and unwinds with
//! [`Stale`] as soon as a newer generation exists.
//!
//! # Invariants
//!
//! 1. The live id never decreases.
//! 2. Only the owning thread bumps; workers only load.
//! 3. A stale token stays stale.
//!
//! Nothing is interrupted: a worker inside a collaborator call finishes that
//! call and notices staleness at its next checkpoint.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one (selection, mode) snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Wrap a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Marker returned when work belongs to a superseded generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stale;

impl fmt::Display for Stale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("generation superseded")
    }
}

impl std::error::Error for Stale {}

/// The live generation id, owned by a properties manager.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    live: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Counter starting at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn current(&self) -> Generation {
        Generation(self.live.load(Ordering::Acquire))
    }

    /// Advance to a new generation and return it.
    pub fn bump(&self) -> Generation {
        Generation(self.live.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Token for work started at the current generation.
    pub fn token(&self) -> GenerationToken {
        GenerationToken {
            captured: self.current(),
            live: Arc::clone(&self.live),
        }
    }
}

/// A worker's view of its own generation and the live one.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    captured: Generation,
    live: Arc<AtomicU64>,
}

impl GenerationToken {
    /// Generation this work was started for.
    pub fn generation(&self) -> Generation {
        self.captured
    }

    /// Whether a newer generation has started.
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.live.load(Ordering::Acquire) != self.captured.0
    }

    /// `Err(Stale)` once a newer generation has started.
    #[inline]
    pub fn checkpoint(&self) -> Result<(), Stale> {
        if self.is_stale() { Err(Stale) } else { Ok(()) }
    }
}
