//! Domains and decorators.

use std::collections::BTreeMap;

use crate::diagnostic::{Reference, Span};

/// Languages a domain or decorator carries metadata for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetLanguage {
    Java,
    CSharp,
    TypeScript,
}

impl TargetLanguage {
    /// Maps a section key to its language.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "java" => Some(Self::Java),
            "csharp" => Some(Self::CSharp),
            "ts" => Some(Self::TypeScript),
            _ => None,
        }
    }
}

/// Type of a domain in one target language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetType {
    pub type_name: String,
    pub imports: Vec<String>,
}

/// Domains a value of this domain converts from / to.
#[derive(Debug, Clone, Default)]
pub struct Converters {
    pub from: Vec<Reference>,
    pub to: Vec<Reference>,
}

impl Converters {
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.from.iter().chain(self.to.iter())
    }
}

/// A named, globally-scoped value type.
#[derive(Debug, Clone)]
pub struct Domain {
    pub name: String,
    pub label: String,
    pub length: Option<u32>,
    pub scale: Option<u32>,
    pub targets: BTreeMap<TargetLanguage, TargetType>,
    pub sql_type: Option<String>,
    pub list_domain: Option<Reference>,
    pub converters: Converters,
    pub file: String,
    pub span: Span,
}

/// Per-language decorator metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoratorTarget {
    pub annotations: Vec<String>,
    pub extends: Option<String>,
    pub implements: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Decorator {
    pub name: String,
    pub description: String,
    pub targets: BTreeMap<TargetLanguage, DecoratorTarget>,
    pub file: String,
    pub span: Span,
}
