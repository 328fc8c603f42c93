//! Structural event stream over DSL text.
//!
//! The text is run through the YAML event parser once and the structural
//! events are kept with their positions. Loaders then pull events through an
//! [`EventStream`] cursor, which is where the fail-fast "expected X, found Y"
//! errors come from. No model knowledge lives here.

use std::fmt;
use std::path::{Path, PathBuf};

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

use crate::diagnostic::{CompilerError, Span};

/// A structural parse event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    MappingStart,
    MappingEnd,
    SequenceStart,
    SequenceEnd,
    Scalar(String),
}

/// The kind of a [`ParseEvent`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    MappingStart,
    MappingEnd,
    SequenceStart,
    SequenceEnd,
    Scalar,
}

impl ParseEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ParseEvent::StreamStart => EventKind::StreamStart,
            ParseEvent::StreamEnd => EventKind::StreamEnd,
            ParseEvent::DocumentStart => EventKind::DocumentStart,
            ParseEvent::DocumentEnd => EventKind::DocumentEnd,
            ParseEvent::MappingStart => EventKind::MappingStart,
            ParseEvent::MappingEnd => EventKind::MappingEnd,
            ParseEvent::SequenceStart => EventKind::SequenceStart,
            ParseEvent::SequenceEnd => EventKind::SequenceEnd,
            ParseEvent::Scalar(_) => EventKind::Scalar,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::StreamStart => "stream start",
            EventKind::StreamEnd => "end of file",
            EventKind::DocumentStart => "document start",
            EventKind::DocumentEnd => "document end",
            EventKind::MappingStart => "mapping",
            EventKind::MappingEnd => "end of mapping",
            EventKind::SequenceStart => "sequence",
            EventKind::SequenceEnd => "end of sequence",
            EventKind::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// A parse event and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub event: ParseEvent,
    pub line: usize,
    pub column: usize,
}

/// Receives raw parser events and keeps the structural ones.
#[derive(Default)]
struct Collector {
    tokens: Vec<Token>,
    first_alias: Option<Marker>,
}

impl MarkedEventReceiver for Collector {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        let event = match ev {
            Event::StreamStart => ParseEvent::StreamStart,
            Event::StreamEnd => ParseEvent::StreamEnd,
            Event::DocumentStart => ParseEvent::DocumentStart,
            Event::DocumentEnd => ParseEvent::DocumentEnd,
            Event::MappingStart(..) => ParseEvent::MappingStart,
            Event::MappingEnd => ParseEvent::MappingEnd,
            Event::SequenceStart(..) => ParseEvent::SequenceStart,
            Event::SequenceEnd => ParseEvent::SequenceEnd,
            Event::Scalar(value, ..) => ParseEvent::Scalar(value),
            Event::Alias(..) => {
                self.first_alias.get_or_insert(mark);
                return;
            }
            Event::Nothing => return,
        };

        self.tokens.push(Token {
            event,
            line: mark.line(),
            column: mark.col() + 1,
        });
    }
}

/// Turns raw text into the full list of structural events.
pub fn tokenize(source: &str, file: &Path) -> Result<Vec<Token>, CompilerError> {
    let mut collector = Collector::default();
    let mut parser = Parser::new(source.chars());

    parser
        .load(&mut collector, true)
        .map_err(|e| CompilerError::SyntaxError {
            message: e.info().to_string(),
            file: file.to_path_buf(),
            line: e.marker().line(),
            column: e.marker().col() + 1,
        })?;

    if let Some(mark) = collector.first_alias {
        return Err(CompilerError::UnsupportedAnchor {
            file: file.to_path_buf(),
            line: mark.line(),
            column: mark.col() + 1,
        });
    }

    Ok(collector.tokens)
}

/// Pull cursor over the events of one file.
pub struct EventStream {
    file: PathBuf,
    tokens: Vec<Token>,
    position: usize,
}

impl EventStream {
    pub fn new(source: &str, file: &Path) -> Result<Self, CompilerError> {
        Ok(Self {
            file: file.to_path_buf(),
            tokens: tokenize(source, file)?,
            position: 0,
        })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The next event, without consuming it.
    pub fn peek(&self) -> Option<&ParseEvent> {
        self.tokens.get(self.position).map(|t| &t.event)
    }

    pub fn peek_kind(&self) -> Option<EventKind> {
        self.peek().map(ParseEvent::kind)
    }

    /// Location of the next event (or of the last one at end of input).
    pub fn span(&self) -> Span {
        let token = self
            .tokens
            .get(self.position)
            .or_else(|| self.tokens.last());

        match token {
            Some(t) => Span::new(self.file.clone(), t.line, t.column),
            None => Span::new(self.file.clone(), 1, 1),
        }
    }

    fn next(&mut self, expected: &str) -> Result<Token, CompilerError> {
        match self.tokens.get(self.position) {
            Some(token) => {
                self.position += 1;
                Ok(token.clone())
            }
            None => Err(CompilerError::unexpected(expected, "end of input", &self.span())),
        }
    }

    /// Consumes the next event, which must be of `kind`.
    pub fn expect(&mut self, kind: EventKind) -> Result<Span, CompilerError> {
        let span = self.span();
        let token = self.next(&kind.to_string())?;
        if token.event.kind() != kind {
            self.position -= 1;
            return Err(CompilerError::unexpected(kind.to_string(), token.event.kind().to_string(), &span));
        }
        Ok(span)
    }

    /// Consumes the next event if it is of `kind`.
    pub fn try_consume(&mut self, kind: EventKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consumes a scalar and returns its value with its location.
    pub fn scalar(&mut self) -> Result<(String, Span), CompilerError> {
        let span = self.span();
        match self.next("scalar")?.event {
            ParseEvent::Scalar(value) => Ok((value, span)),
            other => {
                self.position -= 1;
                Err(CompilerError::unexpected("scalar", other.kind().to_string(), &span))
            }
        }
    }

    /// Consumes a scalar, returning only its value.
    pub fn scalar_value(&mut self) -> Result<String, CompilerError> {
        self.scalar().map(|(value, _)| value)
    }

    /// Consumes a mapping, calling `entry` once per key. `entry` must consume
    /// the key and its value.
    pub fn mapping<F>(&mut self, mut entry: F) -> Result<(), CompilerError>
    where
        F: FnMut(&mut Self) -> Result<(), CompilerError>,
    {
        self.expect(EventKind::MappingStart)?;
        while !self.try_consume(EventKind::MappingEnd) {
            entry(self)?;
        }
        Ok(())
    }

    /// Consumes a sequence, calling `item` once per element.
    pub fn sequence<F>(&mut self, mut item: F) -> Result<(), CompilerError>
    where
        F: FnMut(&mut Self) -> Result<(), CompilerError>,
    {
        self.expect(EventKind::SequenceStart)?;
        while !self.try_consume(EventKind::SequenceEnd) {
            item(self)?;
        }
        Ok(())
    }

    /// Consumes a sequence of scalars.
    pub fn scalar_list(&mut self) -> Result<Vec<(String, Span)>, CompilerError> {
        let mut items = Vec::new();
        self.sequence(|s| {
            items.push(s.scalar()?);
            Ok(())
        })?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<EventKind> {
        tokenize(source, Path::new("test.tmd"))
            .unwrap()
            .iter()
            .map(|t| t.event.kind())
            .collect()
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(kinds(""), vec![EventKind::StreamStart, EventKind::StreamEnd]);
    }

    #[test]
    fn test_documents_and_structure() {
        let source = "---\nmodule: Users\ntags:\n  - back\n---\nclass:\n  name: User\n";
        assert_eq!(
            kinds(source),
            vec![
                EventKind::StreamStart,
                EventKind::DocumentStart,
                EventKind::MappingStart,
                EventKind::Scalar,
                EventKind::Scalar,
                EventKind::Scalar,
                EventKind::SequenceStart,
                EventKind::Scalar,
                EventKind::SequenceEnd,
                EventKind::MappingEnd,
                EventKind::DocumentEnd,
                EventKind::DocumentStart,
                EventKind::MappingStart,
                EventKind::Scalar,
                EventKind::MappingStart,
                EventKind::Scalar,
                EventKind::Scalar,
                EventKind::MappingEnd,
                EventKind::MappingEnd,
                EventKind::DocumentEnd,
                EventKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn test_scalar_positions_are_one_based() {
        let tokens = tokenize("module: Users\n", Path::new("test.tmd")).unwrap();
        let value = tokens
            .iter()
            .find(|t| t.event == ParseEvent::Scalar("Users".into()))
            .unwrap();
        assert_eq!((value.line, value.column), (1, 9));
    }

    #[test]
    fn test_syntax_error_has_location() {
        let result = tokenize("module: [Users\n", Path::new("test.tmd"));
        assert!(matches!(result, Err(CompilerError::SyntaxError { line, .. }) if line >= 1));
    }

    #[test]
    fn test_aliases_are_rejected() {
        let result = tokenize("a: &x 1\nb: *x\n", Path::new("test.tmd"));
        assert!(matches!(result, Err(CompilerError::UnsupportedAnchor { line: 2, .. })));
    }

    #[test]
    fn test_expect_reports_found_event() {
        let mut stream = EventStream::new("- a\n", Path::new("test.tmd")).unwrap();
        stream.expect(EventKind::StreamStart).unwrap();
        stream.expect(EventKind::DocumentStart).unwrap();

        let error = stream.expect(EventKind::MappingStart).unwrap_err();
        match error {
            CompilerError::UnexpectedEvent { expected, found, .. } => {
                assert_eq!(expected, "mapping");
                assert_eq!(found, "sequence");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // A failed expectation leaves the cursor in place.
        assert_eq!(stream.peek_kind(), Some(EventKind::SequenceStart));
    }

    #[test]
    fn test_mapping_and_scalar_list() {
        let mut stream = EventStream::new("uses:\n  - A\n  - B\n", Path::new("test.tmd")).unwrap();
        stream.expect(EventKind::StreamStart).unwrap();
        stream.expect(EventKind::DocumentStart).unwrap();

        let mut uses = Vec::new();
        stream
            .mapping(|s| {
                assert_eq!(s.scalar_value()?, "uses");
                uses = s.scalar_list()?;
                Ok(())
            })
            .unwrap();

        let names: Vec<_> = uses.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(uses[1].1.line, 3);
    }
}
