//! Class sections.

use crate::diagnostic::CompilerError;
use crate::frontend::events::EventStream;
use crate::model::{Class, Namespace, Stereotype};
use super::{flag, load_property, reference, references, required};

const SECTION: &str = "class";

/// Loads a `class:` document value.
///
/// The owning file and namespace are stamped by the file loader.
pub fn load_class(stream: &mut EventStream) -> Result<Class, CompilerError> {
    let start = stream.span();

    let mut name = None;
    let mut label = None;
    let mut trigram = None;
    let mut comment = None;
    let mut stereotype = Stereotype::default();
    let mut is_reference = false;
    let mut extends = None;
    let mut decorators = Vec::new();
    let mut order_property = None;
    let mut default_property = None;
    let mut properties = Vec::new();

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "name" => name = Some(s.scalar_value()?),
            "label" => label = Some(s.scalar_value()?),
            "trigram" => trigram = Some(s.scalar_value()?),
            "comment" => comment = Some(s.scalar_value()?),
            "stereotype" => {
                let (value, span) = s.scalar()?;
                stereotype = Stereotype::parse(&value)
                    .ok_or_else(|| CompilerError::invalid_value("stereotype", value.clone(), "Static or Reference", &span))?;
            }
            "reference" => is_reference = flag(s, "reference")?,
            "extends" => extends = Some(reference(s)?),
            "decorators" => decorators = references(s)?,
            "orderProperty" => order_property = Some(reference(s)?),
            "defaultProperty" => default_property = Some(reference(s)?),
            "properties" => s.sequence(|item| {
                properties.push(load_property(item)?);
                Ok(())
            })?,
            _ => return Err(CompilerError::unknown_property(key, SECTION, &span)),
        }
        Ok(())
    })?;

    Ok(Class {
        name: required(name, "name", SECTION, &start)?,
        label,
        trigram,
        comment: required(comment, "comment", SECTION, &start)?,
        stereotype,
        reference: is_reference || stereotype != Stereotype::Plain,
        extends_reference: extends,
        extends: None,
        decorator_references: decorators,
        decorators: Vec::new(),
        order_property,
        default_property,
        properties,
        alias_slots: Vec::new(),
        namespace: Namespace::default(),
        file: String::new(),
        span: start,
    })
}
