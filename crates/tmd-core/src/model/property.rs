//! Class and endpoint properties.

use crate::diagnostic::{Reference, Span};
use super::ElementId;

/// A property of a class, or a parameter / return value of an endpoint.
///
/// `Alias` only exists before resolution: the resolver replaces each
/// placeholder with clones of the properties it points at.
#[derive(Debug, Clone)]
pub enum Property {
    Regular(RegularProperty),
    Association(AssociationProperty),
    Composition(CompositionProperty),
    Alias(AliasProperty),
}

impl Property {
    /// Name of the property. For an unexpanded alias, the aliased class name.
    pub fn name(&self) -> &str {
        match self {
            Property::Regular(p) => &p.name,
            Property::Association(p) => &p.name,
            Property::Composition(p) => &p.name,
            Property::Alias(p) => &p.reference.class.name,
        }
    }

    /// Whether this is a concrete property called `name`. Alias placeholders never match.
    pub fn is_named(&self, name: &str) -> bool {
        !matches!(self, Property::Alias(_)) && self.name() == name
    }

    pub fn is_primary_key(&self) -> bool {
        match self {
            Property::Regular(p) => p.primary_key,
            Property::Association(p) => p.primary_key,
            _ => false,
        }
    }

    /// Regular and association properties carry a single value and can be aliased.
    pub fn is_field(&self) -> bool {
        matches!(self, Property::Regular(_) | Property::Association(_))
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Property::Regular(p) => Some(&p.comment),
            Property::Association(p) => Some(&p.comment),
            Property::Composition(p) => Some(&p.comment),
            Property::Alias(p) => p.comment.as_deref(),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Property::Regular(p) => &p.span,
            Property::Association(p) => &p.span,
            Property::Composition(p) => &p.span,
            Property::Alias(p) => &p.span,
        }
    }

    /// Set when this property was produced by expanding an alias.
    pub fn alias_origin(&self) -> Option<&AliasOrigin> {
        match self {
            Property::Regular(p) => p.alias_origin.as_ref(),
            Property::Association(p) => p.alias_origin.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegularProperty {
    pub name: String,
    pub label: Option<String>,
    pub comment: String,
    pub primary_key: bool,
    pub unique: bool,
    pub required: bool,
    pub default_value: Option<String>,
    pub trigram: Option<String>,
    pub domain_reference: Reference,
    /// Bound domain name.
    pub domain: Option<String>,
    pub alias_origin: Option<AliasOrigin>,
    pub span: Span,
}

/// Multiplicity of an association.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssociationKind {
    OneToOne,
    #[default]
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl AssociationKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "oneToOne" => Some(Self::OneToOne),
            "manyToOne" => Some(Self::ManyToOne),
            "oneToMany" => Some(Self::OneToMany),
            "manyToMany" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    /// Whether the association holds several target keys.
    pub fn is_many(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }
}

#[derive(Debug, Clone)]
pub struct AssociationProperty {
    /// Target class name followed by the role.
    pub name: String,
    pub target: Reference,
    pub role: Option<String>,
    pub kind: AssociationKind,
    pub label: Option<String>,
    pub comment: String,
    pub required: bool,
    pub primary_key: bool,
    /// Bound target class.
    pub association: Option<ElementId>,
    pub alias_origin: Option<AliasOrigin>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositionKind {
    #[default]
    Object,
    List,
}

impl CompositionKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "object" => Some(Self::Object),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompositionProperty {
    pub name: String,
    pub target: Reference,
    pub kind: CompositionKind,
    pub label: Option<String>,
    pub comment: String,
    pub domain_kind_reference: Option<Reference>,
    /// Bound list wrapper domain.
    pub domain_kind: Option<String>,
    /// Bound target class.
    pub composition: Option<ElementId>,
    pub span: Span,
}

/// Target of an alias placeholder: a class, optionally filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasReference {
    pub class: Reference,
    pub include: Vec<Reference>,
    pub exclude: Vec<Reference>,
}

/// Placeholder that expands into copies of another class's properties.
#[derive(Debug, Clone)]
pub struct AliasProperty {
    pub reference: AliasReference,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub label: Option<String>,
    pub comment: Option<String>,
    pub required: Option<bool>,
    pub list_domain_reference: Option<Reference>,
    /// Bound list domain applied to expanded regular properties.
    pub list_domain: Option<String>,
    pub span: Span,
}

impl AliasProperty {
    /// Name given to the copy of a property called `name`.
    pub fn alias_name(&self, name: &str) -> String {
        format!(
            "{}{}{}",
            self.prefix.as_deref().unwrap_or_default(),
            name,
            self.suffix.as_deref().unwrap_or_default()
        )
    }
}

/// Where an expanded property came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOrigin {
    pub class: ElementId,
    pub property: String,
}

/// An alias placeholder set aside by expansion, with its position in the
/// property list as written. Reset puts it back there.
#[derive(Debug, Clone)]
pub(crate) struct AliasSlot {
    pub position: usize,
    pub placeholder: AliasProperty,
}
