//! File loader: one `.tmd` file into one [`ModelFile`].

use std::path::Path;

use tracing::debug;

use crate::config::ModelConfig;
use crate::diagnostic::{CompilerError, Reference};
use crate::model::{ModelFile, Namespace};
use super::events::{EventKind, EventStream};
use super::sections::{self, SectionKind};

/// Parses model files. Holds no state besides the configuration.
#[derive(Debug, Clone)]
pub struct ModelFileLoader {
    config: ModelConfig,
}

impl ModelFileLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Loads the file at `path`, reading it from disk unless `content` is given.
    ///
    /// Returns `Ok(None)` when the file holds no document at all.
    pub fn load(&self, path: &Path, content: Option<&str>) -> Result<Option<ModelFile>, CompilerError> {
        let owned;
        let source = match content {
            Some(content) => content,
            None => {
                owned = std::fs::read_to_string(path).map_err(|e| CompilerError::io(path, e.to_string()))?;
                owned.as_str()
            }
        };

        let name = self.config.file_name(path);
        debug!(file = %name, "Parsing model file");

        let mut stream = EventStream::new(source, path)?;
        stream.expect(EventKind::StreamStart)?;
        if stream.try_consume(EventKind::StreamEnd) {
            return Ok(None);
        }

        let mut file = ModelFile::new(name, path);
        load_header(&mut stream, &mut file)?;

        while !stream.try_consume(EventKind::StreamEnd) {
            stream.expect(EventKind::DocumentStart)?;
            load_section(&mut stream, &mut file)?;
            stream.expect(EventKind::DocumentEnd)?;
        }

        self.stamp(&mut file);
        Ok(Some(file))
    }

    /// Points every entity back at its file and namespace.
    fn stamp(&self, file: &mut ModelFile) {
        let namespace = Namespace {
            app: self.config.app.clone(),
            module: file.module.clone(),
        };

        for class in &mut file.classes {
            class.file = file.name.clone();
            class.namespace = namespace.clone();
        }
        for endpoint in &mut file.endpoints {
            endpoint.file = file.name.clone();
            endpoint.namespace = namespace.clone();
        }
        for domain in &mut file.domains {
            domain.file = file.name.clone();
        }
        for decorator in &mut file.decorators {
            decorator.file = file.name.clone();
        }
    }
}

/// The first document: `module`, `tags`, `uses`.
fn load_header(stream: &mut EventStream, file: &mut ModelFile) -> Result<(), CompilerError> {
    stream.expect(EventKind::DocumentStart)?;
    let start = stream.span();

    let mut module = None;
    stream.mapping(|s| {
        let (key, span) = s.scalar()?;
        match key.as_str() {
            "module" => module = Some(s.scalar_value()?),
            "tags" => file.tags = sections::strings(s)?.into_iter().collect(),
            "uses" => {
                file.uses = s
                    .scalar_list()?
                    .into_iter()
                    .map(|(name, span)| Reference::new(name, span))
                    .collect()
            }
            _ => return Err(CompilerError::unknown_property(key, "file header", &span)),
        }
        Ok(())
    })?;

    file.module = sections::required(module, "module", "file header", &start)?;
    stream.expect(EventKind::DocumentEnd)?;
    Ok(())
}

/// One section document: a mapping with a single section key.
fn load_section(stream: &mut EventStream, file: &mut ModelFile) -> Result<(), CompilerError> {
    stream.expect(EventKind::MappingStart)?;

    let (key, span) = stream.scalar()?;
    let kind = SectionKind::parse(&key).ok_or_else(|| CompilerError::UnknownDocument {
        key: key.clone(),
        file: span.file.clone(),
        line: span.line,
        column: span.column,
    })?;

    match kind {
        SectionKind::Domain => file.domains.push(sections::load_domain(stream)?),
        SectionKind::Decorator => file.decorators.push(sections::load_decorator(stream)?),
        SectionKind::Class => file.classes.push(sections::load_class(stream)?),
        SectionKind::Endpoint => file.endpoints.push(sections::load_endpoint(stream)?),
        SectionKind::Alias => file.aliases.push(sections::load_alias(stream)?),
    }

    // Exactly one key per section document.
    if stream.peek_kind() == Some(EventKind::Scalar) {
        let (extra, span) = stream.scalar()?;
        return Err(CompilerError::unexpected("end of section", format!("key '{extra}'"), &span));
    }
    stream.expect(EventKind::MappingEnd)?;
    Ok(())
}
