//! Classes.

use crate::diagnostic::{Reference, Span};
use super::{AliasSlot, ElementId, Namespace, Property};

/// Classification of a class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stereotype {
    #[default]
    Plain,
    /// Static enumeration: values known at generation time.
    Static,
    /// Reference data, loaded from the database.
    Reference,
}

impl Stereotype {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Static" => Some(Self::Static),
            "Reference" => Some(Self::Reference),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub label: Option<String>,
    pub trigram: Option<String>,
    pub comment: String,
    pub stereotype: Stereotype,
    pub reference: bool,
    pub extends_reference: Option<Reference>,
    /// Bound parent class.
    pub extends: Option<ElementId>,
    pub decorator_references: Vec<Reference>,
    /// Bound decorators, in declaration order.
    pub decorators: Vec<ElementId>,
    pub order_property: Option<Reference>,
    pub default_property: Option<Reference>,
    pub properties: Vec<Property>,
    pub(crate) alias_slots: Vec<AliasSlot>,
    pub namespace: Namespace,
    /// Logical name of the declaring file.
    pub file: String,
    pub span: Span,
}

impl Class {
    pub fn id(&self) -> ElementId {
        ElementId::new(self.file.clone(), self.name.clone())
    }

    /// Properties flagged as primary key.
    pub fn primary_keys(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_primary_key())
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.is_named(name))
    }
}
