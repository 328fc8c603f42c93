//! Property items of classes and endpoints.

use crate::diagnostic::{CompilerError, Span};
use crate::frontend::events::{EventKind, EventStream, ParseEvent};
use crate::model::{
    AliasProperty, AliasReference, AssociationKind, AssociationProperty, CompositionKind,
    CompositionProperty, Property, RegularProperty,
};
use super::{flag, reference, references, required};

/// Loads one property item. The leading key picks the kind.
pub fn load_property(stream: &mut EventStream) -> Result<Property, CompilerError> {
    let start = stream.expect(EventKind::MappingStart)?;

    let leading = match stream.peek() {
        Some(ParseEvent::Scalar(key)) => key.clone(),
        _ => return Err(CompilerError::unexpected("property key", "non-scalar", &stream.span())),
    };

    let property = match leading.as_str() {
        "name" => Property::Regular(load_regular(stream, start)?),
        "association" => Property::Association(load_association(stream, start)?),
        "composition" => Property::Composition(load_composition(stream, start)?),
        "alias" => Property::Alias(load_alias_property(stream, start)?),
        _ => return Err(CompilerError::unknown_property(leading, "property", &stream.span())),
    };

    Ok(property)
}

/// Runs `entry` for each remaining key of the current property mapping.
fn entries<F>(stream: &mut EventStream, mut entry: F) -> Result<(), CompilerError>
where
    F: FnMut(&mut EventStream, &str, &Span) -> Result<(), CompilerError>,
{
    while !stream.try_consume(EventKind::MappingEnd) {
        let (key, span) = stream.scalar()?;
        entry(stream, &key, &span)?;
    }
    Ok(())
}

fn load_regular(stream: &mut EventStream, start: Span) -> Result<RegularProperty, CompilerError> {
    const SECTION: &str = "regular property";

    let mut name = None;
    let mut label = None;
    let mut comment = None;
    let mut primary_key = false;
    let mut unique = false;
    let mut is_required = false;
    let mut default_value = None;
    let mut trigram = None;
    let mut domain = None;

    entries(stream, |s, key, span| {
        match key {
            "name" => name = Some(s.scalar_value()?),
            "label" => label = Some(s.scalar_value()?),
            "comment" => comment = Some(s.scalar_value()?),
            "primaryKey" => primary_key = flag(s, key)?,
            "unique" => unique = flag(s, key)?,
            "required" => is_required = flag(s, key)?,
            "defaultValue" => default_value = Some(s.scalar_value()?),
            "trigram" => trigram = Some(s.scalar_value()?),
            "domain" => domain = Some(reference(s)?),
            _ => return Err(CompilerError::unknown_property(key, SECTION, span)),
        }
        Ok(())
    })?;

    // A primary key is always required and never separately unique.
    if primary_key {
        is_required = true;
        unique = false;
    }

    Ok(RegularProperty {
        name: required(name, "name", SECTION, &start)?,
        label,
        comment: required(comment, "comment", SECTION, &start)?,
        primary_key,
        unique,
        required: is_required,
        default_value,
        trigram,
        domain_reference: required(domain, "domain", SECTION, &start)?,
        domain: None,
        alias_origin: None,
        span: start,
    })
}

fn load_association(stream: &mut EventStream, start: Span) -> Result<AssociationProperty, CompilerError> {
    const SECTION: &str = "association";

    let mut target = None;
    let mut role = None;
    let mut kind = AssociationKind::default();
    let mut label = None;
    let mut comment = None;
    let mut is_required = false;
    let mut primary_key = false;

    entries(stream, |s, key, span| {
        match key {
            "association" => target = Some(reference(s)?),
            "role" => role = Some(s.scalar_value()?.replace(' ', "")),
            "type" => {
                let (value, span) = s.scalar()?;
                kind = AssociationKind::parse(&value).ok_or_else(|| {
                    CompilerError::invalid_value(key, value.clone(), "oneToOne, manyToOne, oneToMany or manyToMany", &span)
                })?;
            }
            "label" => label = Some(s.scalar_value()?),
            "comment" => comment = Some(s.scalar_value()?),
            "required" => is_required = flag(s, key)?,
            "primaryKey" => primary_key = flag(s, key)?,
            _ => return Err(CompilerError::unknown_property(key, SECTION, span)),
        }
        Ok(())
    })?;

    let target = required(target, "association", SECTION, &start)?;
    let name = format!("{}{}", target.name, role.as_deref().unwrap_or_default());

    Ok(AssociationProperty {
        name,
        target,
        role,
        kind,
        label,
        comment: required(comment, "comment", SECTION, &start)?,
        required: is_required || primary_key,
        primary_key,
        association: None,
        alias_origin: None,
        span: start,
    })
}

fn load_composition(stream: &mut EventStream, start: Span) -> Result<CompositionProperty, CompilerError> {
    const SECTION: &str = "composition";

    let mut target = None;
    let mut name = None;
    let mut kind = CompositionKind::default();
    let mut label = None;
    let mut comment = None;
    let mut domain_kind = None;

    entries(stream, |s, key, span| {
        match key {
            "composition" => target = Some(reference(s)?),
            "name" => name = Some(s.scalar_value()?),
            "kind" => {
                let (value, span) = s.scalar()?;
                kind = CompositionKind::parse(&value)
                    .ok_or_else(|| CompilerError::invalid_value(key, value.clone(), "object or list", &span))?;
            }
            "label" => label = Some(s.scalar_value()?),
            "comment" => comment = Some(s.scalar_value()?),
            "domainKind" => domain_kind = Some(reference(s)?),
            _ => return Err(CompilerError::unknown_property(key, SECTION, span)),
        }
        Ok(())
    })?;

    Ok(CompositionProperty {
        name: required(name, "name", SECTION, &start)?,
        target: required(target, "composition", SECTION, &start)?,
        kind,
        label,
        comment: required(comment, "comment", SECTION, &start)?,
        domain_kind_reference: domain_kind,
        domain_kind: None,
        composition: None,
        span: start,
    })
}

fn load_alias_property(stream: &mut EventStream, start: Span) -> Result<AliasProperty, CompilerError> {
    const SECTION: &str = "alias";

    let mut target = None;
    let mut prefix = None;
    let mut suffix = None;
    let mut label = None;
    let mut comment = None;
    let mut is_required = None;
    let mut list_domain = None;

    entries(stream, |s, key, span| {
        match key {
            "alias" => target = Some(load_alias_reference(s, span)?),
            "prefix" => prefix = Some(s.scalar_value()?),
            "suffix" => suffix = Some(s.scalar_value()?),
            "label" => label = Some(s.scalar_value()?),
            "comment" => comment = Some(s.scalar_value()?),
            "required" => is_required = Some(flag(s, key)?),
            "listDomain" => list_domain = Some(reference(s)?),
            _ => return Err(CompilerError::unknown_property(key, SECTION, span)),
        }
        Ok(())
    })?;

    Ok(AliasProperty {
        reference: required(target, "alias", SECTION, &start)?,
        prefix,
        suffix,
        label,
        comment,
        required: is_required,
        list_domain_reference: list_domain,
        list_domain: None,
        span: start,
    })
}

/// Loads the `alias: { class, include, exclude }` target.
fn load_alias_reference(stream: &mut EventStream, start: &Span) -> Result<AliasReference, CompilerError> {
    const SECTION: &str = "alias target";

    let mut class = None;
    let mut include = Vec::new();
    let mut exclude = Vec::new();

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "class" => class = Some(reference(s)?),
            "include" => include = references(s)?,
            "exclude" => exclude = references(s)?,
            _ => return Err(CompilerError::unknown_property(key, SECTION, &span)),
        }
        Ok(())
    })?;

    Ok(AliasReference {
        class: required(class, "class", SECTION, start)?,
        include,
        exclude,
    })
}
