#![forbid(unsafe_code)]

//! Configurable selectable objects.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use inspect_core::{
    Element, ElementRef, Enumerable, PanelValidatable, PropertyFlags, PropertyKind, PropertySink,
    Selectable, SelectableRef, SymbolInstance, SymbolRef,
};

/// A reflected element owned by a [`MockObject`].
#[derive(Debug)]
pub struct MockElement {
    kind: PropertyKind,
    owner: String,
}

impl MockElement {
    /// Label of the owning object.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl Element for MockElement {
    fn kind(&self) -> PropertyKind {
        self.kind.clone()
    }
}

/// A symbol instance owned by a [`MockObject`].
#[derive(Debug)]
pub struct MockSymbol {
    symbol: String,
    owner: String,
}

impl MockSymbol {
    /// Label of the owning object.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl SymbolInstance for MockSymbol {
    fn symbol_name(&self) -> &str {
        &self.symbol
    }
}

type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type Hook = Arc<dyn Fn() + Send + Sync>;

/// A selectable object assembled from builder calls.
///
/// Clones share their element instances and call records, so a test can
/// keep a clone for assertions after handing the object to a selection with
/// [`into_ref`](Self::into_ref).
#[derive(Clone)]
pub struct MockObject {
    label: String,
    elements: Vec<(ElementRef, PropertyFlags, PropertyFlags)>,
    symbols: Vec<SymbolRef>,
    accepted: BTreeSet<String>,
    validator: Option<Validator>,
    on_enumerate: Option<Hook>,
    enumerations: Arc<AtomicUsize>,
    validated: Arc<Mutex<Vec<String>>>,
}

impl MockObject {
    /// Object with no properties that accepts no panel.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            elements: Vec::new(),
            symbols: Vec::new(),
            accepted: BTreeSet::new(),
            validator: None,
            on_enumerate: None,
            enumerations: Arc::new(AtomicUsize::new(0)),
            validated: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a reflected element of `kind` with no flags.
    #[must_use]
    pub fn property(self, kind: &str) -> Self {
        self.property_with_flags(kind, PropertyFlags::empty(), PropertyFlags::empty())
    }

    /// Add a reflected element enumerated with `include`/`exclude` flags.
    #[must_use]
    pub fn property_with_flags(
        mut self,
        kind: &str,
        include: PropertyFlags,
        exclude: PropertyFlags,
    ) -> Self {
        let element: ElementRef = Arc::new(MockElement {
            kind: PropertyKind::owned(kind),
            owner: self.label.clone(),
        });
        self.elements.push((element, include, exclude));
        self
    }

    /// Add several plain reflected elements.
    #[must_use]
    pub fn properties<'a>(self, kinds: impl IntoIterator<Item = &'a str>) -> Self {
        kinds.into_iter().fold(self, Self::property)
    }

    /// Add instances of the named symbols.
    #[must_use]
    pub fn symbols<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.symbols.push(Arc::new(MockSymbol {
                symbol: name.to_owned(),
                owner: self.label.clone(),
            }));
        }
        self
    }

    /// Accept the named panels.
    #[must_use]
    pub fn accepts<'a>(mut self, panels: impl IntoIterator<Item = &'a str>) -> Self {
        self.accepted.extend(panels.into_iter().map(str::to_owned));
        self
    }

    /// Decide panel validity with `validator` instead of the accepted set.
    #[must_use]
    pub fn validate_with(mut self, validator: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Run `hook` at the start of every property enumeration.
    ///
    /// Runs on whatever thread enumerates, usually a worker.
    #[must_use]
    pub fn on_enumerate(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_enumerate = Some(Arc::new(hook));
        self
    }

    /// Hand the object to a selection.
    pub fn into_ref(self) -> SelectableRef {
        Arc::new(self)
    }

    /// The element of `kind` this object enumerates, if any.
    pub fn element(&self, kind: &str) -> Option<ElementRef> {
        self.elements
            .iter()
            .find(|(element, _, _)| element.kind().as_str() == kind)
            .map(|(element, _, _)| Arc::clone(element))
    }

    /// The instance of `symbol` this object enumerates, if any.
    pub fn symbol(&self, symbol: &str) -> Option<SymbolRef> {
        self.symbols
            .iter()
            .find(|instance| instance.symbol_name() == symbol)
            .cloned()
    }

    /// Times [`Enumerable::enumerate_properties`] has been called.
    pub fn enumeration_count(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    /// Panel names this object was asked about, in call order.
    pub fn validated(&self) -> Vec<String> {
        self.validated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Enumerable for MockObject {
    fn enumerate_properties(&self, sink: &mut PropertySink) {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_enumerate {
            hook();
        }
        for (element, include, exclude) in &self.elements {
            sink.element(Arc::clone(element), *include, *exclude);
        }
    }

    fn enumerate_symbol_instances(&self, sink: &mut PropertySink) {
        for instance in &self.symbols {
            sink.symbol(Arc::clone(instance));
        }
    }
}

impl PanelValidatable for MockObject {
    fn validate_panel(&self, name: &str) -> bool {
        self.validated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(name.to_owned());
        match &self.validator {
            Some(validator) => validator(name),
            None => self.accepted.contains(name),
        }
    }
}

impl Selectable for MockObject {
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.label)
    }
}

impl fmt::Debug for MockObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockObject")
            .field("label", &self.label)
            .field("elements", &self.elements.len())
            .field("symbols", &self.symbols.len())
            .field("accepted", &self.accepted)
            .finish()
    }
}
