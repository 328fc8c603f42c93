//! Domain sections.

use std::collections::BTreeMap;

use crate::diagnostic::CompilerError;
use crate::frontend::events::EventStream;
use crate::model::{Converters, Domain, TargetLanguage, TargetType};
use super::{number, reference, references, required, strings};

const SECTION: &str = "domain";

/// Loads a `domain:` document value.
pub fn load_domain(stream: &mut EventStream) -> Result<Domain, CompilerError> {
    let start = stream.span();

    let mut name = None;
    let mut label = None;
    let mut length = None;
    let mut scale = None;
    let mut targets = BTreeMap::new();
    let mut sql_type = None;
    let mut list_domain = None;
    let mut converters = Converters::default();

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        if let Some(language) = TargetLanguage::from_key(&key) {
            targets.insert(language, load_target_type(s, &key)?);
            return Ok(());
        }

        match key.as_str() {
            "name" => name = Some(s.scalar_value()?),
            "label" => label = Some(s.scalar_value()?),
            "length" => length = Some(number(s, "length")?),
            "scale" => scale = Some(number(s, "scale")?),
            "sqlType" => sql_type = Some(s.scalar_value()?),
            "listDomain" => list_domain = Some(reference(s)?),
            "converters" => converters = load_converters(s)?,
            _ => return Err(CompilerError::unknown_property(key, SECTION, &span)),
        }
        Ok(())
    })?;

    Ok(Domain {
        name: required(name, "name", SECTION, &start)?,
        label: required(label, "label", SECTION, &start)?,
        length,
        scale,
        targets,
        sql_type,
        list_domain,
        converters,
        file: String::new(),
        span: start,
    })
}

fn load_target_type(stream: &mut EventStream, language: &str) -> Result<TargetType, CompilerError> {
    let start = stream.span();
    let section = format!("domain {language} type");

    let mut type_name = None;
    let mut imports = Vec::new();

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "type" => type_name = Some(s.scalar_value()?),
            "imports" => imports = strings(s)?,
            _ => return Err(CompilerError::unknown_property(key, &section, &span)),
        }
        Ok(())
    })?;

    Ok(TargetType {
        type_name: required(type_name, "type", &section, &start)?,
        imports,
    })
}

fn load_converters(stream: &mut EventStream) -> Result<Converters, CompilerError> {
    let mut converters = Converters::default();

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "from" => converters.from = references(s)?,
            "to" => converters.to = references(s)?,
            _ => return Err(CompilerError::unknown_property(key, "converters", &span)),
        }
        Ok(())
    })?;

    Ok(converters)
}
