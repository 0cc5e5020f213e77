#![forbid(unsafe_code)]

//! Named panel creators.
//!
//! A panel is a hand-built group of controls offered to every object that
//! validates its name. The registry is assembled once at startup with
//! [`PanelRegistryBuilder`] and then shared read-only (`Arc<PanelRegistry>`)
//! by every properties manager that needs it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::control::ControlTree;
use crate::selection::Selection;

/// Arguments handed to a panel creator.
#[derive(Debug)]
pub struct PanelArgs<'a> {
    /// Registered name of the panel being built.
    pub name: &'a str,
    /// Objects the panel is built for.
    ///
    /// The whole selection in intersection mode; only the objects that
    /// validated this panel in union mode.
    pub selection: &'a Selection,
}

/// Callback that builds a panel's controls into the current scope.
///
/// Must leave the tree's scope depth unchanged.
pub type PanelCreator = Arc<dyn Fn(&PanelArgs<'_>, &mut ControlTree) + Send + Sync>;

/// Errors raised while assembling a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A creator was already registered under this name.
    DuplicatePanel(String),
    /// Panel names must not be empty.
    EmptyName,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicatePanel(name) => {
                write!(f, "panel `{name}` is already registered")
            }
            RegistryError::EmptyName => write!(f, "panel name must not be empty"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Immutable map from panel name to creator, iterated in name order.
#[derive(Clone, Default)]
pub struct PanelRegistry {
    creators: BTreeMap<String, PanelCreator>,
}

impl PanelRegistry {
    /// Start assembling a registry.
    pub fn builder() -> PanelRegistryBuilder {
        PanelRegistryBuilder::default()
    }

    /// A registry with no panels.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creator registered under `name`.
    pub fn get(&self, name: &str) -> Option<&PanelCreator> {
        self.creators.get(name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.creators.keys().map(String::as_str)
    }

    /// Number of registered panels.
    pub fn len(&self) -> usize {
        self.creators.len()
    }

    /// Whether no panels are registered.
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl fmt::Debug for PanelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelRegistry")
            .field("panels", &self.creators.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`PanelRegistry`].
#[derive(Default)]
pub struct PanelRegistryBuilder {
    creators: BTreeMap<String, PanelCreator>,
}

impl PanelRegistryBuilder {
    /// Register `creator` under `name`.
    pub fn register<F>(mut self, name: impl Into<String>, creator: F) -> Result<Self, RegistryError>
    where
        F: Fn(&PanelArgs<'_>, &mut ControlTree) + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.creators.contains_key(&name) {
            return Err(RegistryError::DuplicatePanel(name));
        }
        self.creators.insert(name, Arc::new(creator));
        Ok(self)
    }

    /// Freeze the registry for sharing.
    pub fn build(self) -> Arc<PanelRegistry> {
        Arc::new(PanelRegistry {
            creators: self.creators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;

    fn noop(_args: &PanelArgs<'_>, _tree: &mut ControlTree) {}

    #[test]
    fn names_iterate_sorted() {
        let registry = PanelRegistry::builder()
            .register("Zone", noop)
            .and_then(|b| b.register("Anchor", noop))
            .and_then(|b| b.register("Mesh", noop))
            .unwrap()
            .build();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["Anchor", "Mesh", "Zone"]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let err = PanelRegistry::builder()
            .register("Mesh", noop)
            .and_then(|b| b.register("Mesh", noop))
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::DuplicatePanel("Mesh".into()));
        assert_eq!(err.to_string(), "panel `Mesh` is already registered");
    }

    #[test]
    fn empty_name_rejected() {
        let err = PanelRegistry::builder().register("", noop).err().unwrap();
        assert_eq!(err, RegistryError::EmptyName);
    }

    #[test]
    fn creator_builds_into_tree() {
        let registry = PanelRegistry::builder()
            .register("Light", |args: &PanelArgs<'_>, tree: &mut ControlTree| {
                tree.add(Control::label(format!("{} x{}", args.name, args.selection.len())));
            })
            .unwrap()
            .build();

        let selection = Selection::empty();
        let mut tree = ControlTree::new();
        let creator = registry.get("Light").unwrap();
        creator(
            &PanelArgs {
                name: "Light",
                selection: &selection,
            },
            &mut tree,
        );
        assert_eq!(tree.controls()[0].text(), "Light x0");
    }

    #[test]
    fn empty_registry() {
        let registry = PanelRegistry::empty();
        assert!(registry.is_empty());
        assert!(!registry.contains("Mesh"));
    }
}
