#![forbid(unsafe_code)]

//! Property descriptors and the per-object sink they are enumerated into.
//!
//! A selectable object describes itself by pushing descriptors into a
//! [`PropertySink`]. Two families exist:
//!
//! - **Reflected elements** ([`Element`]), bucketed by [`ElementKey`]: the
//!   element's kind plus the include/exclude flags it was enumerated with.
//!   Two descriptors with the same key on different objects are "the same
//!   property" and merge into one group.
//! - **Symbol instances** ([`SymbolInstance`]), bucketed by their symbol
//!   (user-defined type) name.
//!
//! The sink keeps the first descriptor seen per key; later duplicates from the
//! same object are ignored.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

bitflags! {
    /// Flags narrowing which fields of an element an interpreter exposes.
    ///
    /// The same element kind enumerated with different flag sets lands in
    /// different groups.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct PropertyFlags: u32 {
        /// Hidden from the default view.
        const HIDDEN    = 1 << 0;
        /// Displayed but not editable.
        const READ_ONLY = 1 << 1;
        /// Only shown in advanced mode.
        const ADVANCED  = 1 << 2;
        /// Field is discarded on save.
        const TRANSIENT = 1 << 3;
        /// Field holds an asset reference.
        const ASSET     = 1 << 4;
    }
}

/// The reflected type of an element, e.g. `"Transform"` or `"Material"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyKind(Cow<'static, str>);

impl PropertyKind {
    /// Kind with a static name.
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Kind with a runtime-built name.
    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The kind's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grouping key for reflected elements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementKey {
    /// Reflected type of the element.
    pub kind: PropertyKind,
    /// Flags the element was enumerated with.
    pub include: PropertyFlags,
    /// Flags excluded when the element was enumerated.
    pub exclude: PropertyFlags,
}

impl ElementKey {
    /// Key for `kind` with no flags.
    pub fn plain(kind: PropertyKind) -> Self {
        Self {
            kind,
            include: PropertyFlags::empty(),
            exclude: PropertyFlags::empty(),
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (+{:#x} -{:#x})",
            self.kind,
            self.include.bits(),
            self.exclude.bits()
        )
    }
}

/// Composite grouping key: either a reflected element shape or a symbol type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyGroupKey {
    /// Reflected element bucket.
    Element(ElementKey),
    /// Symbol (user-defined type) bucket.
    Symbol(String),
}

/// A reflected property descriptor owned by a selectable object.
pub trait Element: Send + Sync + fmt::Debug {
    /// Reflected type of this element.
    fn kind(&self) -> PropertyKind;
}

/// An instance of a symbol-described user-defined type.
pub trait SymbolInstance: Send + Sync + fmt::Debug {
    /// Name of the symbol this instance is typed by.
    fn symbol_name(&self) -> &str;
}

/// Shared handle to a reflected element.
pub type ElementRef = Arc<dyn Element>;

/// Shared handle to a symbol instance.
pub type SymbolRef = Arc<dyn SymbolInstance>;

/// Collects one object's descriptors.
///
/// Cleared and refilled for every object during selection processing.
#[derive(Debug, Default)]
pub struct PropertySink {
    elements: BTreeMap<ElementKey, ElementRef>,
    symbols: BTreeMap<String, SymbolRef>,
}

impl PropertySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reflected element enumerated with the given flags.
    ///
    /// Returns `false` if an element with the same key was already recorded.
    pub fn element(
        &mut self,
        element: ElementRef,
        include: PropertyFlags,
        exclude: PropertyFlags,
    ) -> bool {
        let key = ElementKey {
            kind: element.kind(),
            include,
            exclude,
        };
        match self.elements.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(element);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Record a symbol instance.
    ///
    /// Returns `false` if an instance of the same symbol was already recorded.
    pub fn symbol(&mut self, instance: SymbolRef) -> bool {
        match self.symbols.entry(instance.symbol_name().to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(instance);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Drop everything recorded so far.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.symbols.clear();
    }

    /// Recorded elements by key.
    pub fn elements(&self) -> &BTreeMap<ElementKey, ElementRef> {
        &self.elements
    }

    /// Recorded symbol instances by symbol name.
    pub fn symbols(&self) -> &BTreeMap<String, SymbolRef> {
        &self.symbols
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.symbols.is_empty()
    }

    /// All recorded keys, elements first.
    pub fn group_keys(&self) -> impl Iterator<Item = PropertyGroupKey> + '_ {
        self.elements
            .keys()
            .cloned()
            .map(PropertyGroupKey::Element)
            .chain(self.symbols.keys().cloned().map(PropertyGroupKey::Symbol))
    }
}
