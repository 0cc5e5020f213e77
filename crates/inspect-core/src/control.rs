#![forbid(unsafe_code)]

//! Editable controls and the scoped tree they are built into.
//!
//! Panels and interpreters never touch the live container. They append
//! [`Control`]s to a [`ControlTree`] owned by the aggregation run; the
//! finished top-level controls are attached to the container later, on the
//! thread that owns it.
//!
//! # Scopes
//!
//! [`ControlTree::push_scope`] opens a group: subsequent controls become its
//! children until the matching [`ControlTree::pop_scope`]. Every producer must
//! leave the scope depth exactly as it found it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::property::PropertyKind;

/// Process-wide control id source.
static NEXT_CONTROL_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlId(u64);

impl ControlId {
    fn next() -> Self {
        Self(NEXT_CONTROL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What a control is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    /// Collapsible container of child controls (panels, property groups).
    Group,
    /// Static text.
    Label,
    /// Value editor bound to a property of the given kind.
    Field(PropertyKind),
}

/// A node in the editable control tree.
#[derive(Debug, Clone)]
pub struct Control {
    id: ControlId,
    kind: ControlKind,
    label: String,
    value: Option<String>,
    children: Vec<Control>,
}

impl Control {
    fn with_kind(kind: ControlKind, label: impl Into<String>) -> Self {
        Self {
            id: ControlId::next(),
            kind,
            label: label.into(),
            value: None,
            children: Vec::new(),
        }
    }

    /// A collapsible group.
    pub fn group(label: impl Into<String>) -> Self {
        Self::with_kind(ControlKind::Group, label)
    }

    /// A static label.
    pub fn label(text: impl Into<String>) -> Self {
        Self::with_kind(ControlKind::Label, text)
    }

    /// A value editor for a property of `kind`.
    pub fn field(label: impl Into<String>, kind: PropertyKind) -> Self {
        Self::with_kind(ControlKind::Field(kind), label)
    }

    /// Add a child control (builder form).
    #[must_use]
    pub fn child(mut self, control: Control) -> Self {
        self.children.push(control);
        self
    }

    /// Unique id.
    pub fn id(&self) -> ControlId {
        self.id
    }

    /// Kind of control.
    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    /// Display text.
    pub fn text(&self) -> &str {
        &self.label
    }

    /// Child controls in display order.
    pub fn children(&self) -> &[Control] {
        &self.children
    }

    /// Last value pulled from the bound data, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Store a value pulled from the bound data.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    /// Number of controls in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Control::subtree_len).sum::<usize>()
    }
}

/// Scratch container that panels and interpreters build controls into.
#[derive(Debug, Default)]
pub struct ControlTree {
    roots: Vec<Control>,
    open: Vec<Control>,
}

impl ControlTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `scope`; controls added until the matching pop become its children.
    pub fn push_scope(&mut self, scope: Control) {
        self.open.push(scope);
    }

    /// Close the innermost open scope and attach it to its parent.
    ///
    /// Returns `false` if no scope was open.
    pub fn pop_scope(&mut self) -> bool {
        let Some(scope) = self.open.pop() else {
            return false;
        };
        self.add(scope);
        true
    }

    /// Append a control to the innermost open scope, or to the top level.
    pub fn add(&mut self, control: Control) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(control),
            None => self.roots.push(control),
        }
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Completed top-level controls.
    pub fn controls(&self) -> &[Control] {
        &self.roots
    }

    /// Whether nothing has been added at the top level and no scope is open.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.open.is_empty()
    }

    /// Finish the tree, closing any scope left open.
    pub fn into_controls(mut self) -> Vec<Control> {
        while self.pop_scope() {}
        self.roots
    }
}
