#![forbid(unsafe_code)]

//! Interpreters turn merged property groups into controls.
//!
//! After selection processing, every surviving element group and symbol
//! group gets its own interpreter. The interpreter sees one instance per
//! selected object and appends controls that edit all of them at once.
//! Interpreters are kept alive alongside the controls they produced.

use std::fmt;

use crate::control::ControlTree;
use crate::property::{ElementKey, ElementRef, PropertyFlags, SymbolRef};

/// Builds controls for a group of reflected elements sharing one [`ElementKey`].
pub trait ReflectInterpreter: Send {
    /// Append controls for `instances` (one per object, selection order).
    fn interpret(
        &mut self,
        tree: &mut ControlTree,
        instances: &[ElementRef],
        include: PropertyFlags,
        exclude: PropertyFlags,
    );
}

/// Builds controls for a group of instances of one symbol.
pub trait SymbolInterpreter: Send {
    /// Append controls for `instances` (one per object, selection order).
    fn interpret(&mut self, tree: &mut ControlTree, instances: &[SymbolRef]);
}

/// Creates interpreters for surviving groups.
pub trait InterpreterFactory: Send + Sync {
    /// Interpreter for reflected elements grouped under `key`.
    fn reflect_interpreter(&self, key: &ElementKey) -> Box<dyn ReflectInterpreter>;

    /// Interpreter for instances of `symbol`.
    fn symbol_interpreter(&self, symbol: &str) -> Box<dyn SymbolInterpreter>;
}

/// Interpreters kept alive for one applied result.
#[derive(Default)]
pub struct InterpreterSet {
    /// Reflect interpreters, keyed like the groups they interpreted.
    pub reflect: Vec<(ElementKey, Box<dyn ReflectInterpreter>)>,
    /// Symbol interpreters, keyed by symbol name.
    pub symbol: Vec<(String, Box<dyn SymbolInterpreter>)>,
}

impl InterpreterSet {
    /// Total number of interpreters held.
    pub fn len(&self) -> usize {
        self.reflect.len() + self.symbol.len()
    }

    /// Whether no interpreters are held.
    pub fn is_empty(&self) -> bool {
        self.reflect.is_empty() && self.symbol.is_empty()
    }
}

impl fmt::Debug for InterpreterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterSet")
            .field(
                "reflect",
                &self.reflect.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            )
            .field(
                "symbol",
                &self.symbol.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
