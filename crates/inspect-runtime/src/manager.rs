#![forbid(unsafe_code)]

//! The properties manager.
//!
//! Owns the live container and drives a recompute whenever the selection or
//! the aggregation mode changes. Every change bumps the generation first, so
//! any worker still running for an older snapshot abandons its work at its
//! next checkpoint and its result, if already posted, is discarded.
//!
//! # Lifecycle
//!
//! ```text
//! set_selection / set_mode
//!   -> bump generation, mark dirty
//!   -> reset container
//!   -> hidden?          stop; on_container_shown() retries
//!   -> empty selection? finalize an empty result now
//!   -> otherwise        spawn worker (thread count +1)
//!
//! worker: selection processing -> panels -> interpreters -> post result
//!
//! process_results / wait_for_result (owning thread)
//!   -> notify listeners
//!   -> finalize if the generation is still current
//! ```
//!
//! The manager is not `Sync`. All methods run on the thread that owns the
//! container; only [`WorkerTask`](crate::worker) code runs elsewhere.

use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use inspect_core::{Container, InterpreterFactory, InterpreterSet, PanelRegistry, Selection};

use crate::aggregate::AggregateOptions;
use crate::config::{AggregationMode, ManagerConfig};
use crate::finalize::{FinalizeOutcome, Finalizer};
use crate::generation::{Generation, GenerationCounter};
use crate::listeners::{ListenerId, Listeners};
use crate::thread_count::ThreadCounter;
use crate::worker::{PropertiesCreated, ResultNotifier, WorkerTask};

/// Rebuilds a container's controls from the current selection.
pub struct PropertiesManager<C: Container> {
    container: C,
    registry: Arc<PanelRegistry>,
    interpreters: Arc<dyn InterpreterFactory>,
    config: ManagerConfig,
    selection: Selection,
    mode: AggregationMode,
    generation: GenerationCounter,
    dirty: bool,
    threads: Arc<ThreadCounter>,
    finalizer: Finalizer,
    sender: mpsc::Sender<PropertiesCreated>,
    receiver: mpsc::Receiver<PropertiesCreated>,
    listeners: Listeners<PropertiesCreated>,
    notifier: Option<ResultNotifier>,
}

impl<C: Container> PropertiesManager<C> {
    /// Manager for `container` with an empty selection.
    pub fn new(
        container: C,
        registry: Arc<PanelRegistry>,
        interpreters: Arc<dyn InterpreterFactory>,
        config: ManagerConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            container,
            registry,
            interpreters,
            mode: config.mode,
            config,
            selection: Selection::empty(),
            generation: GenerationCounter::new(),
            dirty: false,
            threads: ThreadCounter::new(),
            finalizer: Finalizer::default(),
            sender,
            receiver,
            listeners: Listeners::new(),
            notifier: None,
        }
    }

    /// Replace the selection and recompute.
    ///
    /// Always starts a new generation, even for an identical selection.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        let generation = self.generation.bump();
        self.dirty = true;
        tracing::debug!(%generation, objects = self.selection.len(), "selection changed");
        crate::debug_trace!(
            "set_selection: generation={} objects={}",
            generation,
            self.selection.len()
        );
        self.recompute();
    }

    /// Switch aggregation mode and recompute.
    pub fn set_mode(&mut self, mode: AggregationMode) {
        self.mode = mode;
        let generation = self.generation.bump();
        self.dirty = true;
        tracing::debug!(%generation, %mode, "aggregation mode changed");
        crate::debug_trace!("set_mode: generation={} mode={}", generation, mode);
        self.recompute();
    }

    /// Recompute if a change arrived while the container was hidden.
    ///
    /// Call whenever the container becomes visible.
    pub fn on_container_shown(&mut self) {
        if self.dirty {
            tracing::debug!(generation = %self.generation.current(), "container shown: recomputing");
            self.recompute();
        }
    }

    /// Current aggregation mode.
    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// Current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// Whether a change is waiting for the container to become visible.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Configuration this manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Whether any worker is still running.
    ///
    /// Commands that mutate selected objects (delete, undo) should refuse to
    /// run while this is `true`.
    pub fn threads_active(&self) -> bool {
        self.threads.is_active()
    }

    /// Number of running workers.
    pub fn active_threads(&self) -> usize {
        self.threads.active()
    }

    /// Block until no worker is running, or `timeout` elapses.
    ///
    /// Returns `true` once idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        self.threads
            .wait_until_idle(timeout, self.config.idle_poll_interval)
    }

    /// Container being populated.
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Mutable access to the container, e.g. to toggle visibility.
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// Generation whose controls are in the container, if any.
    pub fn applied_generation(&self) -> Option<Generation> {
        self.finalizer.applied()
    }

    /// Interpreters behind the applied controls.
    pub fn interpreters(&self) -> &InterpreterSet {
        self.finalizer.interpreters()
    }

    /// Call `callback` for every worker result delivered by
    /// [`process_results`](Self::process_results) or
    /// [`wait_for_result`](Self::wait_for_result), before it is finalized.
    ///
    /// Listeners also see results that are about to be discarded; compare
    /// [`PropertiesCreated::generation`] with [`generation`](Self::generation)
    /// to tell them apart.
    pub fn add_properties_created_listener(
        &mut self,
        callback: impl FnMut(&PropertiesCreated) + 'static,
    ) -> ListenerId {
        self.listeners.add(callback)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_properties_created_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Call `notifier` from the worker thread each time a result is posted.
    pub fn set_result_notifier(&mut self, notifier: impl Fn(Generation) + Send + Sync + 'static) {
        self.notifier = Some(Arc::new(notifier));
    }

    /// Remove the result notifier.
    pub fn clear_result_notifier(&mut self) {
        self.notifier = None;
    }

    /// Deliver every posted result without blocking.
    pub fn process_results(&mut self) -> Vec<FinalizeOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(created) = self.receiver.try_recv() {
            outcomes.push(self.deliver(created));
        }
        outcomes
    }

    /// Block until one result is posted, then deliver it.
    ///
    /// Returns `None` if nothing arrives within `timeout`.
    pub fn wait_for_result(&mut self, timeout: Duration) -> Option<FinalizeOutcome> {
        let created = self.receiver.recv_timeout(timeout).ok()?;
        Some(self.deliver(created))
    }

    /// Block until the current generation is applied, discarding older
    /// results on the way.
    ///
    /// Returns `true` at once if it is already applied, `false` on timeout.
    pub fn wait_for_current(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.applied_generation() == Some(self.generation.current()) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(created) => {
                    self.deliver(created);
                }
                Err(_) => return false,
            }
        }
    }

    fn deliver(&mut self, created: PropertiesCreated) -> FinalizeOutcome {
        self.listeners.notify(&created);
        self.finalizer
            .finalize(&mut self.container, self.generation.current(), created)
    }

    fn recompute(&mut self) {
        self.finalizer.reset(&mut self.container);

        if !self.container.is_visible() {
            tracing::debug!(generation = %self.generation.current(), "container hidden: recompute deferred");
            return;
        }
        self.dirty = false;

        let token = self.generation.token();
        let generation = token.generation();

        if self.selection.is_empty() {
            let outcome = self.finalizer.finalize(
                &mut self.container,
                generation,
                PropertiesCreated::empty(generation),
            );
            tracing::debug!(%generation, ?outcome, "empty selection finalized");
            return;
        }

        let task = WorkerTask {
            selection: self.selection.clone(),
            token,
            options: AggregateOptions::new(self.mode)
                .with_early_exit(self.config.early_exit)
                .with_property_merge(self.config.property_merge),
            registry: Arc::clone(&self.registry),
            interpreters: Arc::clone(&self.interpreters),
        };
        let spawned = task.spawn(
            &self.config.thread_name,
            self.threads.enter(),
            self.sender.clone(),
            self.notifier.clone(),
        );

        match spawned {
            Ok(()) => {
                tracing::debug!(%generation, active = self.threads.active(), "worker spawned");
            }
            Err(err) => {
                tracing::error!(%generation, error = %err, "failed to spawn properties worker");
                self.dirty = true;
            }
        }
    }
}

impl<C: Container> Drop for PropertiesManager<C> {
    fn drop(&mut self) {
        // In-flight workers see a newer generation and stop at their next checkpoint.
        self.generation.bump();
    }
}

impl<C: Container + std::fmt::Debug> std::fmt::Debug for PropertiesManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertiesManager")
            .field("container", &self.container)
            .field("registry", &self.registry)
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .field("generation", &self.generation.current())
            .field("dirty", &self.dirty)
            .field("active_threads", &self.threads.active())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
