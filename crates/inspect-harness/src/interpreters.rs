#![forbid(unsafe_code)]

//! An interpreter factory that records what it interpreted.

use std::sync::{Arc, Mutex};

use inspect_core::{
    Control, ControlTree, ElementKey, ElementRef, InterpreterFactory, PropertyFlags,
    ReflectInterpreter, SymbolInterpreter, SymbolRef,
};

type Record = Arc<Mutex<Vec<(String, usize)>>>;

/// Adds one control per group and records `(group, instance count)`.
///
/// Reflected groups become a field control labelled with the element kind;
/// symbol groups become a group control labelled with the symbol name. Each
/// gets one label child per instance.
#[derive(Debug, Clone, Default)]
pub struct CountingInterpreters {
    record: Record,
}

impl CountingInterpreters {
    /// Factory with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups interpreted so far, in call order.
    pub fn interpreted(&self) -> Vec<(String, usize)> {
        self.record
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

fn push(record: &Record, group: &str, instances: usize) {
    record
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push((group.to_owned(), instances));
}

struct CountingReflect {
    key: ElementKey,
    record: Record,
}

impl ReflectInterpreter for CountingReflect {
    fn interpret(
        &mut self,
        tree: &mut ControlTree,
        instances: &[ElementRef],
        _include: PropertyFlags,
        _exclude: PropertyFlags,
    ) {
        push(&self.record, self.key.kind.as_str(), instances.len());
        let mut field = Control::field(self.key.kind.as_str(), self.key.kind.clone());
        for (index, _) in instances.iter().enumerate() {
            field = field.child(Control::label(format!("#{index}")));
        }
        tree.add(field);
    }
}

struct CountingSymbol {
    symbol: String,
    record: Record,
}

impl SymbolInterpreter for CountingSymbol {
    fn interpret(&mut self, tree: &mut ControlTree, instances: &[SymbolRef]) {
        push(&self.record, &self.symbol, instances.len());
        tree.push_scope(Control::group(self.symbol.as_str()));
        for (index, _) in instances.iter().enumerate() {
            tree.add(Control::label(format!("#{index}")));
        }
        tree.pop_scope();
    }
}

impl InterpreterFactory for CountingInterpreters {
    fn reflect_interpreter(&self, key: &ElementKey) -> Box<dyn ReflectInterpreter> {
        Box::new(CountingReflect {
            key: key.clone(),
            record: Arc::clone(&self.record),
        })
    }

    fn symbol_interpreter(&self, symbol: &str) -> Box<dyn SymbolInterpreter> {
        Box::new(CountingSymbol {
            symbol: symbol.to_owned(),
            record: Arc::clone(&self.record),
        })
    }
}
