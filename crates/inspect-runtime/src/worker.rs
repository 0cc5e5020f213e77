#![forbid(unsafe_code)]

//! Background aggregation workers.
//!
//! A [`WorkerTask`] owns everything one run needs: an immutable selection
//! snapshot, its [`GenerationToken`], shared handles to the registry and
//! interpreter factory, and the sending half of the manager's result channel.
//! It runs all three passes on its own thread and posts a
//! [`PropertiesCreated`] back. A stale run posts nothing.

use std::fmt;
use std::io;
use std::sync::{Arc, mpsc};
use std::thread;

use inspect_core::{
    Control, ControlTree, InterpreterFactory, InterpreterSet, PanelRegistry, Selection,
};

use crate::aggregate::{AggregateOptions, aggregate};
use crate::generation::{Generation, GenerationToken, Stale};
use crate::materialize::{build_panels, interpret_groups};
use crate::thread_count::ActiveTask;

/// Called from the worker thread after a result has been posted.
///
/// Lets a host wake its UI loop so it calls
/// [`process_results`](crate::PropertiesManager::process_results) promptly.
pub type ResultNotifier = Arc<dyn Fn(Generation) + Send + Sync>;

/// Controls and interpreters produced for one generation.
pub struct PropertiesCreated {
    /// Generation the result was computed for.
    pub generation: Generation,
    /// Top-level controls: panels first, then interpreted groups.
    pub controls: Vec<Control>,
    /// Interpreters that produced the group controls.
    pub interpreters: InterpreterSet,
}

impl PropertiesCreated {
    /// A result with no controls.
    pub fn empty(generation: Generation) -> Self {
        Self {
            generation,
            controls: Vec::new(),
            interpreters: InterpreterSet::default(),
        }
    }
}

impl fmt::Debug for PropertiesCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertiesCreated")
            .field("generation", &self.generation)
            .field("controls", &self.controls.len())
            .field("interpreters", &self.interpreters)
            .finish()
    }
}

/// One aggregation run, ready to go to a thread.
pub struct WorkerTask {
    pub(crate) selection: Selection,
    pub(crate) token: GenerationToken,
    pub(crate) options: AggregateOptions,
    pub(crate) registry: Arc<PanelRegistry>,
    pub(crate) interpreters: Arc<dyn InterpreterFactory>,
}

impl WorkerTask {
    /// Run all three passes on the calling thread.
    pub fn generate(&self) -> Result<PropertiesCreated, Stale> {
        let aggregation = aggregate(&self.selection, &self.registry, &self.options, &self.token)?;

        let mut tree = ControlTree::new();
        build_panels(&aggregation, &self.registry, &mut tree, &self.token)?;
        let interpreters =
            interpret_groups(&aggregation, self.interpreters.as_ref(), &mut tree, &self.token)?;
        self.token.checkpoint()?;

        Ok(PropertiesCreated {
            generation: self.token.generation(),
            controls: tree.into_controls(),
            interpreters,
        })
    }

    /// Run on a new named thread, posting a fresh result to `results`.
    ///
    /// `active` is held until the thread exits. If the thread cannot be
    /// spawned it is dropped before this returns.
    pub fn spawn(
        self,
        name: &str,
        active: ActiveTask,
        results: mpsc::Sender<PropertiesCreated>,
        notifier: Option<ResultNotifier>,
    ) -> io::Result<()> {
        thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let _active = active;
                let generation = self.token.generation();
                crate::debug_trace!("worker started: generation={}", generation);

                match self.generate() {
                    Ok(created) => {
                        let controls = created.controls.len();
                        if results.send(created).is_err() {
                            tracing::debug!(%generation, "result dropped: manager gone");
                            return;
                        }
                        tracing::debug!(%generation, controls, "properties created");
                        crate::debug_trace!("worker posted: generation={}", generation);
                        if let Some(notify) = notifier {
                            notify(generation);
                        }
                    }
                    Err(Stale) => {
                        tracing::debug!(%generation, "worker abandoned stale generation");
                        crate::debug_trace!("worker stale: generation={}", generation);
                    }
                }
            })
            .map(drop)
    }
}
