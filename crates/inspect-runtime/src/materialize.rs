#![forbid(unsafe_code)]

//! Panel materialization and property interpretation: the second and third
//! aggregation passes.
//!
//! Both passes append to one [`ControlTree`] owned by the worker. Nothing
//! here touches the live container.

use inspect_core::{
    Control, ControlTree, InterpreterFactory, InterpreterSet, PanelArgs, PanelRegistry,
};

use crate::aggregate::Aggregation;
use crate::generation::{GenerationToken, Stale};

/// Build every applicable panel into `tree`, in panel-name order.
///
/// Each creator runs inside a fresh group scope named after its panel and
/// sees the objects the panel applies to.
///
/// # Panics
///
/// Panics if a creator leaves scopes open or pops scopes it did not push.
pub fn build_panels(
    aggregation: &Aggregation,
    registry: &PanelRegistry,
    tree: &mut ControlTree,
    token: &GenerationToken,
) -> Result<(), Stale> {
    let _span = tracing::debug_span!(
        "panel_materialization",
        generation = %token.generation(),
        panels = aggregation.panels.len(),
    )
    .entered();

    for (name, objects) in &aggregation.panels {
        token.checkpoint()?;

        let Some(creator) = registry.get(name) else {
            tracing::error!(panel = %name, "applicable panel missing from registry");
            continue;
        };

        let depth = tree.depth();
        tree.push_scope(Control::group(name.as_str()));
        creator(
            &PanelArgs {
                name,
                selection: objects,
            },
            tree,
        );
        assert_eq!(
            tree.depth(),
            depth + 1,
            "panel `{name}` left the control scope stack unbalanced"
        );
        tree.pop_scope();

        tracing::trace!(panel = %name, objects = objects.len(), "panel built");
    }

    Ok(())
}

/// Create one interpreter per surviving group and let it append controls.
///
/// Reflected groups run first, then symbol groups, each in key order. The
/// interpreters are returned so they can outlive the worker.
pub fn interpret_groups(
    aggregation: &Aggregation,
    factory: &dyn InterpreterFactory,
    tree: &mut ControlTree,
    token: &GenerationToken,
) -> Result<InterpreterSet, Stale> {
    let mut set = InterpreterSet::default();

    {
        let _span = tracing::debug_span!(
            "reflect_interpret",
            generation = %token.generation(),
            groups = aggregation.properties.len(),
        )
        .entered();

        for (key, instances) in &aggregation.properties {
            token.checkpoint()?;
            let mut interpreter = factory.reflect_interpreter(key);
            interpreter.interpret(tree, instances, key.include, key.exclude);
            set.reflect.push((key.clone(), interpreter));
        }
    }

    {
        let _span = tracing::debug_span!(
            "symbol_interpret",
            generation = %token.generation(),
            groups = aggregation.symbols.len(),
        )
        .entered();

        for (symbol, instances) in &aggregation.symbols {
            token.checkpoint()?;
            let mut interpreter = factory.symbol_interpreter(symbol);
            interpreter.interpret(tree, instances);
            set.symbol.push((symbol.clone(), interpreter));
        }
    }

    Ok(set)
}
