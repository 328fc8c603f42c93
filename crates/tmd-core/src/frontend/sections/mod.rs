//! Section loaders.
//!
//! Each loader consumes the value of one document's leading key and returns a
//! partially-populated entity. Structural problems fail immediately; names of
//! other model elements are kept as [`Reference`]s for the resolver.

mod alias;
mod class;
mod decorator;
mod domain;
mod endpoint;
mod property;

pub use alias::load_alias;
pub use class::load_class;
pub use decorator::load_decorator;
pub use domain::load_domain;
pub use endpoint::load_endpoint;
pub use property::load_property;

use crate::diagnostic::{CompilerError, Reference, Span};
use super::events::EventStream;

/// The section kinds a document can start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Domain,
    Decorator,
    Class,
    Endpoint,
    Alias,
}

impl SectionKind {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "domain" => Some(Self::Domain),
            "decorator" => Some(Self::Decorator),
            "class" => Some(Self::Class),
            "endpoint" => Some(Self::Endpoint),
            "alias" => Some(Self::Alias),
            _ => None,
        }
    }
}

/// Unwraps a required key's value.
pub(crate) fn required<T>(value: Option<T>, key: &str, section: &str, span: &Span) -> Result<T, CompilerError> {
    value.ok_or_else(|| CompilerError::missing_property(key, section, span))
}

/// Consumes a `true` / `false` scalar.
pub(crate) fn flag(stream: &mut EventStream, key: &str) -> Result<bool, CompilerError> {
    let (value, span) = stream.scalar()?;
    match value.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CompilerError::invalid_value(key, value, "true or false", &span)),
    }
}

/// Consumes a non-negative integer scalar.
pub(crate) fn number(stream: &mut EventStream, key: &str) -> Result<u32, CompilerError> {
    let (value, span) = stream.scalar()?;
    value
        .parse()
        .map_err(|_| CompilerError::invalid_value(key, value, "a non-negative integer", &span))
}

/// Consumes a scalar as a reference.
pub(crate) fn reference(stream: &mut EventStream) -> Result<Reference, CompilerError> {
    let (name, span) = stream.scalar()?;
    Ok(Reference::new(name, span))
}

/// Consumes a sequence of scalars as references.
pub(crate) fn references(stream: &mut EventStream) -> Result<Vec<Reference>, CompilerError> {
    Ok(stream
        .scalar_list()?
        .into_iter()
        .map(|(name, span)| Reference::new(name, span))
        .collect())
}

/// Consumes a sequence of plain strings.
pub(crate) fn strings(stream: &mut EventStream) -> Result<Vec<String>, CompilerError> {
    Ok(stream.scalar_list()?.into_iter().map(|(value, _)| value).collect())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use crate::frontend::events::{EventKind, EventStream};

    /// Positions a stream on the value of a single-key document.
    pub fn section_stream(source: &str) -> EventStream {
        let mut stream = EventStream::new(source, Path::new("test.tmd")).unwrap();
        stream.expect(EventKind::StreamStart).unwrap();
        stream.expect(EventKind::DocumentStart).unwrap();
        stream.expect(EventKind::MappingStart).unwrap();
        stream.scalar().unwrap();
        stream
    }
}
