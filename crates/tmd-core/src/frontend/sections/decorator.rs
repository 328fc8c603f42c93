//! Decorator sections.

use std::collections::BTreeMap;

use crate::diagnostic::CompilerError;
use crate::frontend::events::EventStream;
use crate::model::{Decorator, DecoratorTarget, TargetLanguage};
use super::{required, strings};

const SECTION: &str = "decorator";

/// Loads a `decorator:` document value.
pub fn load_decorator(stream: &mut EventStream) -> Result<Decorator, CompilerError> {
    let start = stream.span();

    let mut name = None;
    let mut description = None;
    let mut targets = BTreeMap::new();

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "name" => name = Some(s.scalar_value()?),
            "description" => description = Some(s.scalar_value()?),
            "java" | "csharp" => {
                let language = TargetLanguage::from_key(&key)
                    .ok_or_else(|| CompilerError::unknown_property(key.clone(), SECTION, &span))?;
                targets.insert(language, load_target(s)?);
            }
            _ => return Err(CompilerError::unknown_property(key, SECTION, &span)),
        }
        Ok(())
    })?;

    Ok(Decorator {
        name: required(name, "name", SECTION, &start)?,
        description: required(description, "description", SECTION, &start)?,
        targets,
        file: String::new(),
        span: start,
    })
}

fn load_target(stream: &mut EventStream) -> Result<DecoratorTarget, CompilerError> {
    let mut target = DecoratorTarget::default();

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "annotations" => target.annotations = strings(s)?,
            "extends" => target.extends = Some(s.scalar_value()?),
            "implements" => target.implements = strings(s)?,
            _ => return Err(CompilerError::unknown_property(key, "decorator target", &span)),
        }
        Ok(())
    })?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::sections::test_support::section_stream;

    #[test]
    fn test_load_decorator() {
        let source = "\
decorator:
  name: Auditable
  description: Adds audit columns
  java:
    annotations:
      - \"@EntityListeners(AuditingEntityListener.class)\"
    implements:
      - Auditable
";
        let mut stream = section_stream(source);
        let decorator = load_decorator(&mut stream).unwrap();

        assert_eq!(decorator.name, "Auditable");
        let java = &decorator.targets[&TargetLanguage::Java];
        assert_eq!(java.annotations.len(), 1);
        assert_eq!(java.implements, vec!["Auditable"]);
        assert!(java.extends.is_none());
    }

    #[test]
    fn test_typescript_target_is_rejected() {
        let mut stream = section_stream("decorator:\n  name: A\n  description: B\n  ts:\n    annotations: []\n");
        let error = load_decorator(&mut stream).unwrap_err();
        assert!(matches!(error, CompilerError::UnknownProperty { ref key, .. } if key == "ts"));
    }
}
