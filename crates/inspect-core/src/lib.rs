#![forbid(unsafe_code)]

//! Core: selectable-object capabilities, property grouping, panels, and controls.
//!
//! # Role in the inspector
//! `inspect-core` defines everything the aggregation runtime talks to without
//! owning: the objects being inspected, the registry of hand-built panels,
//! the interpreters that turn property groups into controls, and the live
//! container the controls end up in. Nothing here spawns threads.

pub mod container;
pub mod control;
pub mod interpret;
pub mod panel;
pub mod property;
pub mod selection;

pub use container::{Container, FreezeGuard, ScrollOffset};
pub use control::{Control, ControlId, ControlKind, ControlTree};
pub use interpret::{InterpreterFactory, InterpreterSet, ReflectInterpreter, SymbolInterpreter};
pub use panel::{PanelArgs, PanelCreator, PanelRegistry, PanelRegistryBuilder, RegistryError};
pub use property::{
    Element, ElementKey, ElementRef, PropertyFlags, PropertyGroupKey, PropertyKind, PropertySink,
    SymbolInstance, SymbolRef,
};
pub use selection::{Enumerable, PanelValidatable, Selectable, SelectableRef, Selection};
