//! Endpoint sections.

use crate::diagnostic::CompilerError;
use crate::frontend::events::EventStream;
use crate::model::{Endpoint, HttpMethod, Namespace};
use super::{flag, load_property, required};

const SECTION: &str = "endpoint";

/// Loads an `endpoint:` document value.
pub fn load_endpoint(stream: &mut EventStream) -> Result<Endpoint, CompilerError> {
    let start = stream.span();

    let mut name = None;
    let mut method = None;
    let mut route = None;
    let mut description = None;
    let mut preserve_property_casing = false;
    let mut params = Vec::new();
    let mut returns = None;

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "name" => name = Some(s.scalar_value()?),
            "method" => {
                let (value, span) = s.scalar()?;
                method = Some(HttpMethod::parse(&value).ok_or_else(|| {
                    CompilerError::invalid_value("method", value.clone(), "GET, POST, PUT, DELETE or PATCH", &span)
                })?);
            }
            "route" => route = Some(s.scalar_value()?),
            "description" => description = Some(s.scalar_value()?),
            "preservePropertyCasing" => preserve_property_casing = flag(s, "preservePropertyCasing")?,
            "params" => s.sequence(|item| {
                params.push(load_property(item)?);
                Ok(())
            })?,
            "returns" => returns = Some(load_property(s)?),
            _ => return Err(CompilerError::unknown_property(key, SECTION, &span)),
        }
        Ok(())
    })?;

    Ok(Endpoint {
        name: required(name, "name", SECTION, &start)?,
        method: required(method, "method", SECTION, &start)?,
        route: required(route, "route", SECTION, &start)?,
        description: required(description, "description", SECTION, &start)?,
        preserve_property_casing,
        params,
        returns,
        alias_slots: Vec::new(),
        returns_alias: None,
        namespace: Namespace::default(),
        file: String::new(),
        span: start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::sections::test_support::section_stream;
    use crate::model::Property;

    #[test]
    fn test_load_endpoint() {
        let source = "\
endpoint:
  name: getUser
  method: GET
  route: users/{id}
  description: Loads a user
  params:
    - alias:
        class: User
        include:
          - Id
  returns:
    composition: User
    name: Result
    comment: The user
";
        let mut stream = section_stream(source);
        let endpoint = load_endpoint(&mut stream).unwrap();

        assert_eq!(endpoint.method, HttpMethod::Get);
        assert_eq!(endpoint.params.len(), 1);
        assert!(matches!(endpoint.returns, Some(Property::Composition(_))));
    }

    #[test]
    fn test_invalid_method() {
        let mut stream = section_stream("endpoint:\n  name: a\n  method: FETCH\n  route: a\n  description: a\n");
        let error = load_endpoint(&mut stream).unwrap_err();
        assert!(matches!(error, CompilerError::InvalidValue { ref key, .. } if key == "method"));
    }
}
