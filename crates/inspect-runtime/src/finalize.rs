#![forbid(unsafe_code)]

//! Applying a worker result to the live container.
//!
//! Runs on the owning thread only. A result is applied when its generation
//! is still current and has not been applied before; otherwise it is dropped
//! untouched. Applying attaches every control, then lays the container out
//! while frozen, restores the scroll position captured when the recompute
//! started, and reads current values into the new controls.

use inspect_core::{Container, FreezeGuard, InterpreterSet, ScrollOffset};

use crate::generation::Generation;
use crate::worker::PropertiesCreated;

/// What happened to a delivered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The result was attached to the container.
    Applied {
        /// Generation applied.
        generation: Generation,
        /// Top-level controls attached.
        controls: usize,
    },
    /// The result was dropped.
    Discarded {
        /// Generation of the dropped result.
        generation: Generation,
        /// Live generation at the time.
        current: Generation,
    },
}

impl FinalizeOutcome {
    /// Whether the result was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Generation of the delivered result.
    pub fn generation(&self) -> Generation {
        match *self {
            Self::Applied { generation, .. } | Self::Discarded { generation, .. } => generation,
        }
    }
}

/// Owning-thread state carried between recompute and finalize.
#[derive(Debug, Default)]
pub(crate) struct Finalizer {
    scroll: ScrollOffset,
    applied: Option<Generation>,
    interpreters: InterpreterSet,
}

impl Finalizer {
    /// Clear the container and forget the previously applied result.
    ///
    /// Records the scroll position first so the next result can restore it.
    pub(crate) fn reset<C: Container + ?Sized>(&mut self, container: &mut C) {
        self.scroll = container.scroll_offset();
        container.reset();
        self.interpreters = InterpreterSet::default();
        self.applied = None;
    }

    /// Generation currently applied.
    pub(crate) fn applied(&self) -> Option<Generation> {
        self.applied
    }

    /// Interpreters behind the applied controls.
    pub(crate) fn interpreters(&self) -> &InterpreterSet {
        &self.interpreters
    }

    /// Apply `created` if it belongs to `current` and is not yet applied.
    pub(crate) fn finalize<C: Container + ?Sized>(
        &mut self,
        container: &mut C,
        current: Generation,
        created: PropertiesCreated,
    ) -> FinalizeOutcome {
        let generation = created.generation;
        if generation != current || self.applied == Some(generation) {
            tracing::debug!(%generation, %current, "discarding result");
            crate::debug_trace!("finalize discarded: generation={} current={}", generation, current);
            return FinalizeOutcome::Discarded {
                generation,
                current,
            };
        }

        let _span = tracing::debug_span!("finalize", %generation).entered();
        let controls = created.controls.len();
        for control in created.controls {
            container.attach_control(control);
        }
        {
            let mut frozen = FreezeGuard::new(container);
            frozen.layout();
            frozen.set_scroll_offset(self.scroll);
            frozen.read();
        }

        self.interpreters = created.interpreters;
        self.applied = Some(generation);
        tracing::debug!(%generation, controls, "result applied");
        crate::debug_trace!("finalize applied: generation={} controls={}", generation, controls);

        FinalizeOutcome::Applied {
            generation,
            controls,
        }
    }
}
