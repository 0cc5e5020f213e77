#![forbid(unsafe_code)]

//! Panel registries whose creators log their invocations.

use std::sync::{Arc, Mutex};

use inspect_core::{Control, ControlTree, PanelArgs, PanelRegistry};

type Calls = Arc<Mutex<Vec<(String, Vec<String>)>>>;

/// Shared log of panel creator calls.
#[derive(Debug, Clone, Default)]
pub struct PanelLog {
    calls: Calls,
}

impl PanelLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with one logging creator per name.
    ///
    /// Each creator adds a single label listing the objects it was built for.
    ///
    /// # Panics
    ///
    /// Panics on duplicate or empty names.
    pub fn registry(&self, names: &[&str]) -> Arc<PanelRegistry> {
        let mut builder = PanelRegistry::builder();
        for name in names {
            let calls = Arc::clone(&self.calls);
            builder = builder
                .register(*name, move |args: &PanelArgs<'_>, tree: &mut ControlTree| {
                    let objects: Vec<String> =
                        args.selection.iter().map(|o| o.label().into_owned()).collect();
                    tree.add(Control::label(objects.join(", ")));
                    calls
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push((args.name.to_owned(), objects));
                })
                .unwrap_or_else(|err| panic!("test registry: {err}"));
        }
        builder.build()
    }

    /// `(panel, object labels)` per creator call, in call order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Names of the panels built, in call order.
    pub fn panels(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }
}
