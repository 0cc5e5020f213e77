#![forbid(unsafe_code)]

//! Selection processing: the first aggregation pass.
//!
//! Walks the selection in order and reduces every object's descriptors and
//! panel answers into one [`Aggregation`]:
//!
//! - **Panels, intersection mode.** A running set seeded with every registered
//!   name. Each object is asked only about the names still in the set, and
//!   the names it accepts *replace* the set. A name rejected once can never
//!   come back, even if a later object would accept it.
//! - **Panels, union mode.** Each object is asked about every registered name.
//!   An accepted name is kept along with the objects that accepted it.
//! - **Properties and symbols.** Grouped by key. Object 0 seeds one-element
//!   lists; every later object keeps only the keys it also has and appends its
//!   own instance. With [`PropertyMerge::FollowMode`] in union mode, groups are
//!   unioned instead.
//!
//! Once the running panel set and both group maps are empty, no later object
//! can bring anything back, so the walk stops early.
//!
//! Every step is bracketed by a generation checkpoint; a superseded run
//! returns [`Stale`] with nothing produced.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use inspect_core::{
    ElementKey, ElementRef, PanelRegistry, PropertySink, SelectableRef, Selection, SymbolRef,
};

use crate::config::{AggregationMode, PropertyMerge};
use crate::generation::{GenerationToken, Stale};

/// Knobs for one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Panel reconciliation mode.
    pub mode: AggregationMode,
    /// Stop once nothing common can remain.
    pub early_exit: bool,
    /// Property reconciliation rule.
    pub property_merge: PropertyMerge,
}

impl AggregateOptions {
    /// Options for `mode` with early exit on and intersected properties.
    pub fn new(mode: AggregationMode) -> Self {
        Self {
            mode,
            early_exit: true,
            property_merge: PropertyMerge::Intersect,
        }
    }

    /// Enable or disable early exit.
    #[must_use]
    pub fn with_early_exit(mut self, enabled: bool) -> Self {
        self.early_exit = enabled;
        self
    }

    /// Set the property reconciliation rule.
    #[must_use]
    pub fn with_property_merge(mut self, merge: PropertyMerge) -> Self {
        self.property_merge = merge;
        self
    }

    fn unites_groups(&self) -> bool {
        self.mode == AggregationMode::Union && self.property_merge == PropertyMerge::FollowMode
    }
}

/// Outcome of selection processing.
#[derive(Debug, Default, Clone)]
pub struct Aggregation {
    /// Applicable panels, each with the objects it is built for.
    pub panels: BTreeMap<String, Selection>,
    /// Surviving reflected-element groups, one instance per contributing object.
    pub properties: BTreeMap<ElementKey, Vec<ElementRef>>,
    /// Surviving symbol groups, one instance per contributing object.
    pub symbols: BTreeMap<String, Vec<SymbolRef>>,
    /// Objects examined before the walk finished or exited early.
    pub processed: usize,
    /// Whether the walk stopped before the end of the selection.
    pub exited_early: bool,
}

impl Aggregation {
    /// Whether nothing applies to the selection.
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty() && self.properties.is_empty() && self.symbols.is_empty()
    }

    /// Whether both aggregations hold the same panels, groups, and instances.
    ///
    /// Objects and instances are compared by identity. Bookkeeping fields
    /// (`processed`, `exited_early`) are ignored.
    pub fn same_content(&self, other: &Aggregation) -> bool {
        fn same_lists<K: Ord, T: ?Sized>(
            a: &BTreeMap<K, Vec<Arc<T>>>,
            b: &BTreeMap<K, Vec<Arc<T>>>,
        ) -> bool {
            a.len() == b.len()
                && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
                    ka == kb
                        && va.len() == vb.len()
                        && va.iter().zip(vb.iter()).all(|(x, y)| {
                            Arc::as_ptr(x).cast::<()>() == Arc::as_ptr(y).cast::<()>()
                        })
                })
        }

        self.panels.len() == other.panels.len()
            && self
                .panels
                .iter()
                .zip(other.panels.iter())
                .all(|((na, sa), (nb, sb))| na == nb && sa.same_objects(sb))
            && same_lists(&self.properties, &other.properties)
            && same_lists(&self.symbols, &other.symbols)
    }
}

/// Groups common to the objects processed so far.
#[derive(Debug)]
struct CommonGroups<K, V> {
    groups: BTreeMap<K, Vec<V>>,
}

impl<K: Ord + Clone, V: Clone> CommonGroups<K, V> {
    fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Fold object `index`'s groups in, keeping only keys every object had.
    fn intersect(
        &mut self,
        index: usize,
        current: &BTreeMap<K, V>,
        token: &GenerationToken,
    ) -> Result<(), Stale> {
        if index == 0 {
            for (key, instance) in current {
                token.checkpoint()?;
                self.groups.insert(key.clone(), vec![instance.clone()]);
            }
            return Ok(());
        }

        let mut survivors = BTreeMap::new();
        for (key, mut instances) in std::mem::take(&mut self.groups) {
            token.checkpoint()?;
            if let Some(instance) = current.get(&key) {
                instances.push(instance.clone());
                survivors.insert(key, instances);
            }
        }
        self.groups = survivors;
        Ok(())
    }

    /// Fold object groups in, keeping every key any object had.
    fn unite(&mut self, current: &BTreeMap<K, V>, token: &GenerationToken) -> Result<(), Stale> {
        for (key, instance) in current {
            token.checkpoint()?;
            self.groups
                .entry(key.clone())
                .or_default()
                .push(instance.clone());
        }
        Ok(())
    }

    fn absorb(
        &mut self,
        index: usize,
        current: &BTreeMap<K, V>,
        unite: bool,
        token: &GenerationToken,
    ) -> Result<(), Stale> {
        if unite {
            self.unite(current, token)
        } else {
            self.intersect(index, current, token)
        }
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn validate(object: &SelectableRef, name: &str) -> bool {
    let accepted = object.validate_panel(name);
    tracing::trace!(
        object = %object.label(),
        panel = name,
        accepted,
        "panel validation"
    );
    accepted
}

/// Run selection processing for `selection`.
///
/// Returns [`Stale`] as soon as `token` reports a newer generation.
pub fn aggregate(
    selection: &Selection,
    registry: &PanelRegistry,
    options: &AggregateOptions,
    token: &GenerationToken,
) -> Result<Aggregation, Stale> {
    let _span = tracing::debug_span!(
        "selection_processing",
        generation = %token.generation(),
        objects = selection.len(),
        mode = %options.mode,
    )
    .entered();

    if selection.is_empty() {
        return Ok(Aggregation::default());
    }

    let unite = options.unites_groups();
    let mut intersecting: BTreeSet<&str> = registry.names().collect();
    let mut unioned: BTreeMap<&str, Vec<SelectableRef>> = BTreeMap::new();
    let mut properties = CommonGroups::<ElementKey, ElementRef>::new();
    let mut symbols = CommonGroups::<String, SymbolRef>::new();
    let mut sink = PropertySink::new();
    let mut processed = 0;
    let mut exited_early = false;

    for (index, object) in selection.iter().enumerate() {
        token.checkpoint()?;

        sink.clear();
        object.enumerate_properties(&mut sink);
        object.enumerate_symbol_instances(&mut sink);

        token.checkpoint()?;

        match options.mode {
            AggregationMode::Intersection => {
                let mut accepted = BTreeSet::new();
                for &name in &intersecting {
                    token.checkpoint()?;
                    if validate(object, name) {
                        accepted.insert(name);
                    }
                }
                intersecting = accepted;
            }
            AggregationMode::Union => {
                for name in registry.names() {
                    token.checkpoint()?;
                    if validate(object, name) {
                        unioned.entry(name).or_default().push(Arc::clone(object));
                    }
                }
            }
        }

        properties.absorb(index, sink.elements(), unite, token)?;
        symbols.absorb(index, sink.symbols(), unite, token)?;
        processed = index + 1;

        if options.early_exit
            && !unite
            && intersecting.is_empty()
            && properties.is_empty()
            && symbols.is_empty()
        {
            exited_early = processed < selection.len();
            break;
        }
    }

    token.checkpoint()?;

    let panels = match options.mode {
        AggregationMode::Intersection => intersecting
            .into_iter()
            .map(|name| (name.to_owned(), selection.clone()))
            .collect(),
        AggregationMode::Union => unioned
            .into_iter()
            .map(|(name, objects)| (name.to_owned(), Selection::new(objects)))
            .collect(),
    };

    tracing::debug!(
        processed,
        exited_early,
        panels = ?panels_names(&panels),
        properties = properties.groups.len(),
        symbols = symbols.groups.len(),
        "selection processed"
    );

    Ok(Aggregation {
        panels,
        properties: properties.groups,
        symbols: symbols.groups,
        processed,
        exited_early,
    })
}

fn panels_names(panels: &BTreeMap<String, Selection>) -> Vec<&str> {
    panels.keys().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationCounter;
    use inspect_core::{PanelArgs, PropertyFlags, PropertyKind};
    use inspect_harness::MockObject;

    fn registry(names: &[&str]) -> Arc<PanelRegistry> {
        let mut builder = PanelRegistry::builder();
        for name in names {
            builder = builder
                .register(*name, |_: &PanelArgs<'_>, _: &mut inspect_core::ControlTree| {})
                .unwrap();
        }
        builder.build()
    }

    fn run(selection: &Selection, registry: &PanelRegistry, options: AggregateOptions) -> Aggregation {
        let counter = GenerationCounter::new();
        aggregate(selection, registry, &options, &counter.token()).unwrap()
    }

    fn key(kind: &'static str) -> ElementKey {
        ElementKey::plain(PropertyKind::new(kind))
    }

    fn panel_names(aggregation: &Aggregation) -> Vec<&str> {
        aggregation.panels.keys().map(String::as_str).collect()
    }

    #[test]
    fn empty_selection_yields_nothing() {
        let aggregation = run(
            &Selection::empty(),
            &registry(&["P1"]),
            AggregateOptions::new(AggregationMode::Intersection),
        );
        assert!(aggregation.is_empty());
        assert_eq!(aggregation.processed, 0);
    }

    #[test]
    fn intersection_scenario() {
        let a = MockObject::new("A")
            .properties(["x", "y"])
            .accepts(["P1", "P2"]);
        let b = MockObject::new("B")
            .properties(["y", "z"])
            .accepts(["P2", "P3"]);
        let selection = Selection::new([a.clone().into_ref(), b.clone().into_ref()]);

        let aggregation = run(
            &selection,
            &registry(&["P1", "P2", "P3"]),
            AggregateOptions::new(AggregationMode::Intersection),
        );

        assert_eq!(panel_names(&aggregation), vec!["P2"]);
        assert!(aggregation.panels["P2"].same_objects(&selection));
        assert_eq!(aggregation.properties.len(), 1);
        let y = &aggregation.properties[&key("y")];
        assert_eq!(y.len(), 2);
        assert!(Arc::ptr_eq(&y[0], &a.element("y").unwrap()));
        assert!(Arc::ptr_eq(&y[1], &b.element("y").unwrap()));
    }

    #[test]
    fn union_scenario_keeps_sub_selections() {
        let a = MockObject::new("A")
            .properties(["x", "y"])
            .accepts(["P1", "P2"])
            .into_ref();
        let b = MockObject::new("B")
            .properties(["y", "z"])
            .accepts(["P2", "P3"])
            .into_ref();
        let selection = Selection::new([a.clone(), b.clone()]);

        let aggregation = run(
            &selection,
            &registry(&["P1", "P2", "P3"]),
            AggregateOptions::new(AggregationMode::Union),
        );

        assert_eq!(panel_names(&aggregation), vec!["P1", "P2", "P3"]);
        assert!(aggregation.panels["P1"].same_objects(&Selection::new([a.clone()])));
        assert!(aggregation.panels["P2"].same_objects(&selection));
        assert!(aggregation.panels["P3"].same_objects(&Selection::new([b.clone()])));

        // Properties still intersect by default.
        let keys: Vec<_> = aggregation.properties.keys().cloned().collect();
        assert_eq!(keys, vec![key("y")]);
    }

    #[test]
    fn union_with_follow_mode_unites_properties() {
        let a = MockObject::new("A").properties(["x", "y"]);
        let b = MockObject::new("B").properties(["y", "z"]);
        let selection = Selection::new([a.clone().into_ref(), b.clone().into_ref()]);

        let aggregation = run(
            &selection,
            &registry(&[]),
            AggregateOptions::new(AggregationMode::Union)
                .with_property_merge(PropertyMerge::FollowMode),
        );

        let keys: Vec<_> = aggregation.properties.keys().cloned().collect();
        assert_eq!(keys, vec![key("x"), key("y"), key("z")]);
        assert_eq!(aggregation.properties[&key("x")].len(), 1);
        assert_eq!(aggregation.properties[&key("y")].len(), 2);
        assert!(Arc::ptr_eq(
            &aggregation.properties[&key("z")][0],
            &b.element("z").unwrap()
        ));
        assert!(!aggregation.exited_early);
    }

    #[test]
    fn follow_mode_still_intersects_in_intersection_mode() {
        let a = MockObject::new("A").properties(["x", "y"]);
        let b = MockObject::new("B").properties(["y", "z"]);
        let selection = Selection::new([a.into_ref(), b.into_ref()]);

        let aggregation = run(
            &selection,
            &registry(&[]),
            AggregateOptions::new(AggregationMode::Intersection)
                .with_property_merge(PropertyMerge::FollowMode),
        );
        let keys: Vec<_> = aggregation.properties.keys().cloned().collect();
        assert_eq!(keys, vec![key("y")]);
    }

    #[test]
    fn flags_are_part_of_the_group_key() {
        let a = MockObject::new("A").property_with_flags(
            "light",
            PropertyFlags::ADVANCED,
            PropertyFlags::empty(),
        );
        let b = MockObject::new("B").property("light");
        let selection = Selection::new([a.into_ref(), b.into_ref()]);

        let aggregation = run(
            &selection,
            &registry(&[]),
            AggregateOptions::new(AggregationMode::Intersection).with_early_exit(false),
        );
        assert!(aggregation.properties.is_empty());
    }

    #[test]
    fn symbols_intersect_by_name() {
        let a = MockObject::new("A").symbols(["EntityData", "ShaderData"]);
        let b = MockObject::new("B").symbols(["ShaderData"]);
        let selection = Selection::new([a.into_ref(), b.into_ref()]);

        let aggregation = run(
            &selection,
            &registry(&[]),
            AggregateOptions::new(AggregationMode::Intersection),
        );
        let names: Vec<_> = aggregation.symbols.keys().cloned().collect();
        assert_eq!(names, vec!["ShaderData".to_owned()]);
        assert_eq!(aggregation.symbols["ShaderData"].len(), 2);
    }

    #[test]
    fn early_exit_stops_walking() {
        let a = MockObject::new("A").property("x").accepts(["P1"]);
        let b = MockObject::new("B").property("y").accepts(["P2"]);
        let c = MockObject::new("C").property("x").accepts(["P1"]);
        let selection = Selection::new([a.into_ref(), b.into_ref(), c.clone().into_ref()]);

        let aggregation = run(
            &selection,
            &registry(&["P1", "P2"]),
            AggregateOptions::new(AggregationMode::Intersection),
        );
        assert!(aggregation.is_empty());
        assert_eq!(aggregation.processed, 2);
        assert!(aggregation.exited_early);
        assert_eq!(c.enumeration_count(), 0);
    }

    #[test]
    fn early_exit_never_fires_in_union_mode_with_panels() {
        let a = MockObject::new("A").property("x");
        let b = MockObject::new("B").property("y");
        let c = MockObject::new("C").accepts(["P1"]).into_ref();
        let selection = Selection::new([a.into_ref(), b.into_ref(), c.clone()]);

        let aggregation = run(
            &selection,
            &registry(&["P1"]),
            AggregateOptions::new(AggregationMode::Union),
        );
        assert_eq!(aggregation.processed, 3);
        assert_eq!(panel_names(&aggregation), vec!["P1"]);
        assert!(aggregation.panels["P1"].same_objects(&Selection::new([c])));
    }

    #[test]
    fn early_exit_matches_full_walk() {
        let objects = [
            MockObject::new("A").property("x").accepts(["P1"]),
            MockObject::new("B").property("y").accepts(["P2"]),
            MockObject::new("C").property("x").accepts(["P1", "P2"]),
        ];
        let selection: Selection = objects.iter().map(|o| o.clone().into_ref()).collect();
        let registry = registry(&["P1", "P2"]);

        let fast = run(
            &selection,
            &registry,
            AggregateOptions::new(AggregationMode::Intersection),
        );
        let full = run(
            &selection,
            &registry,
            AggregateOptions::new(AggregationMode::Intersection).with_early_exit(false),
        );
        assert!(fast.same_content(&full));
        assert_eq!(full.processed, 3);
    }

    #[test]
    fn intersection_validates_only_against_surviving_panels() {
        let a = MockObject::new("A").accepts(["P1", "P2"]);
        let b = MockObject::new("B").accepts(["P2", "P3"]);
        let c = MockObject::new("C").accepts(["P1", "P2", "P3"]);
        let selection = Selection::new([
            a.clone().into_ref(),
            b.clone().into_ref(),
            c.clone().into_ref(),
        ]);

        let aggregation = run(
            &selection,
            &registry(&["P1", "P2", "P3"]),
            AggregateOptions::new(AggregationMode::Intersection),
        );

        assert_eq!(a.validated(), vec!["P1", "P2", "P3"]);
        assert_eq!(b.validated(), vec!["P1", "P2"]);
        assert_eq!(c.validated(), vec!["P2"]);
        assert_eq!(panel_names(&aggregation), vec!["P2"]);
    }

    #[test]
    fn rejected_panel_never_returns() {
        // Validation that flips on later calls must not revive a name that an
        // earlier object rejected.
        let a = MockObject::new("A").accepts(["P1"]);
        let b = MockObject::new("B").validate_with(|_| true);
        let selection = Selection::new([a.into_ref(), b.clone().into_ref()]);

        let aggregation = run(
            &selection,
            &registry(&["P1", "P2"]),
            AggregateOptions::new(AggregationMode::Intersection),
        );
        assert_eq!(panel_names(&aggregation), vec!["P1"]);
        assert_eq!(b.validated(), vec!["P1"]);
    }

    #[test]
    fn union_validates_against_full_registry() {
        let a = MockObject::new("A").accepts(["P1"]);
        let b = MockObject::new("B").accepts(["P2"]);
        let selection = Selection::new([a.clone().into_ref(), b.clone().into_ref()]);

        run(
            &selection,
            &registry(&["P1", "P2"]),
            AggregateOptions::new(AggregationMode::Union),
        );
        assert_eq!(a.validated(), vec!["P1", "P2"]);
        assert_eq!(b.validated(), vec!["P1", "P2"]);
    }

    #[test]
    fn stale_before_start_produces_nothing() {
        let counter = GenerationCounter::new();
        let token = counter.token();
        counter.bump();

        let a = MockObject::new("A").property("x");
        let selection = Selection::new([a.clone().into_ref()]);
        let result = aggregate(
            &selection,
            &registry(&[]),
            &AggregateOptions::new(AggregationMode::Intersection),
            &token,
        );
        assert_eq!(result.err(), Some(Stale));
        assert_eq!(a.enumeration_count(), 0);
    }

    #[test]
    fn stale_between_objects_stops_the_walk() {
        let counter = Arc::new(GenerationCounter::new());
        let token = counter.token();

        let bump = Arc::clone(&counter);
        let a = MockObject::new("A")
            .property("x")
            .on_enumerate(move || {
                bump.bump();
            });
        let b = MockObject::new("B").property("x");
        let selection = Selection::new([a.into_ref(), b.clone().into_ref()]);

        let result = aggregate(
            &selection,
            &registry(&["P1"]),
            &AggregateOptions::new(AggregationMode::Intersection),
            &token,
        );
        assert!(result.is_err());
        assert_eq!(b.enumeration_count(), 0);
    }
}
