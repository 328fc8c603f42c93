//! In-memory model.
//!
//! Ownership is tree-shaped: a [`ModelFile`] owns its classes, domains,
//! decorators, endpoints and aliases, and a class owns its properties.
//! Everything that points across that tree (a class's parent, an association
//! target, a property's domain) is a name-keyed link ([`ElementId`] or a domain
//! name) bound by the resolver against the store's registry.

mod alias;
mod class;
mod domain;
mod endpoint;
mod property;

pub use alias::Alias;
pub use class::{Class, Stereotype};
pub use domain::{Converters, Decorator, DecoratorTarget, Domain, TargetLanguage, TargetType};
pub use endpoint::{Endpoint, HttpMethod};
pub use property::{
    AliasOrigin, AliasProperty, AliasReference, AssociationKind, AssociationProperty,
    CompositionKind, CompositionProperty, Property, RegularProperty,
};
pub(crate) use property::AliasSlot;

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::diagnostic::Reference;

/// Identity of a class or decorator: owning file plus name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    pub file: String,
    pub name: String,
}

impl ElementId {
    pub fn new(file: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file, self.name)
    }
}

/// Application and module a class or endpoint is generated into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    pub app: String,
    pub module: String,
}

/// Classes and endpoints pulled in from other files by file-level aliases.
///
/// Local entries they replaced are kept so that a later resolution pass can
/// restore them before re-applying the aliases.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAliases {
    pub classes: BTreeSet<String>,
    pub endpoints: BTreeSet<String>,
    pub(crate) shadowed_classes: Vec<Class>,
    pub(crate) shadowed_endpoints: Vec<Endpoint>,
}

/// One loaded model file.
#[derive(Debug, Clone)]
pub struct ModelFile {
    /// Logical name: path relative to the model root, extension stripped.
    pub name: String,
    pub path: PathBuf,
    pub module: String,
    pub tags: BTreeSet<String>,
    pub uses: Vec<Reference>,
    pub classes: Vec<Class>,
    pub domains: Vec<Domain>,
    pub decorators: Vec<Decorator>,
    pub endpoints: Vec<Endpoint>,
    pub aliases: Vec<Alias>,
    pub resolved_aliases: ResolvedAliases,
}

impl ModelFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            module: String::new(),
            tags: BTreeSet::new(),
            uses: Vec::new(),
            classes: Vec::new(),
            domains: Vec::new(),
            decorators: Vec::new(),
            endpoints: Vec::new(),
            aliases: Vec::new(),
            resolved_aliases: ResolvedAliases::default(),
        }
    }

    /// Classes declared in this file, without the ones re-exported from others.
    pub fn own_classes(&self) -> impl Iterator<Item = &Class> {
        self.classes
            .iter()
            .filter(|c| !self.resolved_aliases.classes.contains(&c.name))
    }

    /// Endpoints declared in this file, without the ones re-exported from others.
    pub fn own_endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints
            .iter()
            .filter(|e| !self.resolved_aliases.endpoints.contains(&e.name))
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}
