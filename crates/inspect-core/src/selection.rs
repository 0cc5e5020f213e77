#![forbid(unsafe_code)]

//! Selectable-object capabilities and immutable selection snapshots.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::property::PropertySink;

/// Can describe its editable properties.
pub trait Enumerable {
    /// Push this object's reflected elements into `sink`.
    fn enumerate_properties(&self, sink: &mut PropertySink);

    /// Push this object's symbol instances into `sink`.
    fn enumerate_symbol_instances(&self, _sink: &mut PropertySink) {}
}

/// Can decide whether a named panel applies to it.
pub trait PanelValidatable {
    /// Whether the panel registered under `name` should be shown for this object.
    fn validate_panel(&self, name: &str) -> bool;
}

/// A domain object that can take part in a selection.
///
/// Aggregation reads selected objects from a worker thread, hence the
/// `Send + Sync` bound.
pub trait Selectable: Enumerable + PanelValidatable + Send + Sync {
    /// Short human-readable label, used in logs.
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed("object")
    }
}

/// Shared handle to a selected object.
pub type SelectableRef = Arc<dyn Selectable>;

/// Thin pointer for identity comparison of trait objects.
fn identity(object: &SelectableRef) -> *const () {
    Arc::as_ptr(object).cast::<()>()
}

/// An ordered, duplicate-free, immutable snapshot of selected objects.
///
/// Cloning is cheap; aggregation runs keep their own snapshot while the
/// editor moves on to the next selection.
#[derive(Clone, Default)]
pub struct Selection {
    items: Arc<[SelectableRef]>,
}

impl Selection {
    /// Build a selection, dropping repeated references to the same object.
    ///
    /// The first occurrence of each object keeps its position.
    pub fn new(objects: impl IntoIterator<Item = SelectableRef>) -> Self {
        let objects = objects.into_iter();
        let mut seen: HashSet<*const ()> = HashSet::with_capacity(objects.size_hint().0);
        let mut items: Vec<SelectableRef> = Vec::with_capacity(objects.size_hint().0);
        for object in objects {
            if seen.insert(identity(&object)) {
                items.push(object);
            }
        }
        Self {
            items: items.into(),
        }
    }

    /// The empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `object` is part of this selection (by identity).
    pub fn contains(&self, object: &SelectableRef) -> bool {
        let id = identity(object);
        self.items.iter().any(|item| identity(item) == id)
    }

    /// Whether both selections hold the same objects in the same order.
    pub fn same_objects(&self, other: &Selection) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(other.items.iter())
                .all(|(a, b)| identity(a) == identity(b))
    }
}

impl Deref for Selection {
    type Target = [SelectableRef];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl FromIterator<SelectableRef> for Selection {
    fn from_iter<T: IntoIterator<Item = SelectableRef>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items.iter().map(|item| item.label()))
            .finish()
    }
}
