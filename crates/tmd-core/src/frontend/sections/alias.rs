//! File-level alias sections.

use crate::diagnostic::CompilerError;
use crate::frontend::events::EventStream;
use crate::model::Alias;
use super::{reference, references, required};

const SECTION: &str = "alias";

/// Loads an `alias:` document value.
pub fn load_alias(stream: &mut EventStream) -> Result<Alias, CompilerError> {
    let start = stream.span();

    let mut file = None;
    let mut classes = Vec::new();
    let mut endpoints = Vec::new();

    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "file" => file = Some(reference(s)?),
            "classes" => classes = references(s)?,
            "endpoints" => endpoints = references(s)?,
            _ => return Err(CompilerError::unknown_property(key, SECTION, &span)),
        }
        Ok(())
    })?;

    Ok(Alias {
        file: required(file, "file", SECTION, &start)?,
        classes,
        endpoints,
        span: start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::sections::test_support::section_stream;

    #[test]
    fn test_load_alias() {
        let mut stream = section_stream("alias:\n  file: Common/Users\n  classes:\n    - User\n    - Profile\n");
        let alias = load_alias(&mut stream).unwrap();

        assert_eq!(alias.file.name, "Common/Users");
        assert_eq!(alias.classes.len(), 2);
        assert!(alias.endpoints.is_empty());
    }

    #[test]
    fn test_alias_requires_file() {
        let mut stream = section_stream("alias:\n  classes:\n    - User\n");
        let error = load_alias(&mut stream).unwrap_err();
        assert!(matches!(error, CompilerError::MissingProperty { ref key, .. } if key == "file"));
    }
}
