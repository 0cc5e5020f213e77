#![forbid(unsafe_code)]

//! Property inspector public facade crate.
//!
//! Re-exports the collaborator traits from `inspect-core` and the
//! [`PropertiesManager`] from `inspect-runtime`, plus a prelude.
//!
//! ```ignore
//! use inspect::prelude::*;
//!
//! let registry = PanelRegistry::builder()
//!     .register("Transform", |args: &PanelArgs<'_>, tree: &mut ControlTree| {
//!         tree.add(Control::label(format!("{} objects", args.selection.len())));
//!     })?
//!     .build();
//! let mut manager = PropertiesManager::new(container, registry, interpreters, ManagerConfig::from_env()?);
//! manager.set_selection(selection);
//! // later, on the UI thread:
//! manager.process_results();
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use inspect_core::{
    Container, Control, ControlId, ControlKind, ControlTree, Element, ElementKey, ElementRef,
    Enumerable, FreezeGuard, InterpreterFactory, InterpreterSet, PanelArgs, PanelCreator,
    PanelRegistry, PanelRegistryBuilder, PanelValidatable, PropertyFlags, PropertyGroupKey,
    PropertyKind, PropertySink, ReflectInterpreter, RegistryError, ScrollOffset, Selectable,
    SelectableRef, Selection, SymbolInstance, SymbolInterpreter, SymbolRef,
};

// --- Runtime re-exports ----------------------------------------------------

pub use inspect_runtime::{
    AggregationMode, ConfigError, FinalizeOutcome, Generation, ListenerId, ManagerConfig,
    PropertiesCreated, PropertiesManager, PropertyMerge, ResultNotifier,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for inspector setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Panel registry could not be built.
    Registry(RegistryError),
    /// Configuration could not be read.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(err) => write!(f, "panel registry: {err}"),
            Self::Config(err) => write!(f, "configuration: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for inspector APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AggregationMode, Container, Control, ControlTree, Enumerable, Error, FinalizeOutcome,
        InterpreterFactory, ManagerConfig, PanelArgs, PanelRegistry, PanelValidatable,
        PropertiesManager, PropertyFlags, PropertySink, Result, Selectable, Selection,
    };

    pub use crate::{core, runtime};
}

pub use inspect_core as core;
pub use inspect_runtime as runtime;
