//! Fail-fast error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use super::Span;

/// Errors that stop the loading of a file (or of the store itself).
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum CompilerError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to read '{path}': {message}")]
    #[diagnostic(code(tmd::io::read_error))]
    IoError {
        path: PathBuf,
        message: String,
    },

    #[error("Invalid configuration '{path}': {message}")]
    #[diagnostic(
        code(tmd::io::invalid_config),
        help("Configuration keys are camelCase: app, modelRoot, allowCompositePrimaryKey, nowarn, debounceMs")
    )]
    InvalidConfig {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Syntax error: {message}")]
    #[diagnostic(code(tmd::parse::syntax_error))]
    SyntaxError {
        message: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Expected {expected}, found {found} ({}:{line}:{column})", file.display())]
    #[diagnostic(code(tmd::parse::unexpected_event))]
    UnexpectedEvent {
        expected: String,
        found: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("YAML aliases are not supported in model files ({}:{line}:{column})", file.display())]
    #[diagnostic(
        code(tmd::parse::unsupported_alias),
        help("Repeat the value, or use an `alias` property / document to share definitions.")
    )]
    UnsupportedAnchor {
        file: PathBuf,
        line: usize,
        column: usize,
    },

    // =========================================================================
    // Section Errors
    // =========================================================================
    #[error("Unknown property '{key}' in {section} ({}:{line}:{column})", file.display())]
    #[diagnostic(code(tmd::section::unknown_property))]
    UnknownProperty {
        key: String,
        section: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Missing required property '{key}' in {section} ({}:{line}:{column})", file.display())]
    #[diagnostic(code(tmd::section::missing_property))]
    MissingProperty {
        key: String,
        section: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Invalid value '{value}' for '{key}': expected {expected} ({}:{line}:{column})", file.display())]
    #[diagnostic(code(tmd::section::invalid_value))]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Unknown document type '{key}' ({}:{line}:{column})", file.display())]
    #[diagnostic(
        code(tmd::section::unknown_document),
        help("Each document after the header must start with one of: domain, decorator, class, endpoint, alias")
    )]
    UnknownDocument {
        key: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    // =========================================================================
    // Watch Errors
    // =========================================================================
    #[error("Failed to watch '{}': {message}", path.display())]
    #[diagnostic(code(tmd::watch::failed))]
    WatchFailed {
        path: PathBuf,
        message: String,
    },
}

impl CompilerError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>, span: &Span) -> Self {
        Self::UnexpectedEvent {
            expected: expected.into(),
            found: found.into(),
            file: span.file.clone(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn unknown_property(key: impl Into<String>, section: &str, span: &Span) -> Self {
        Self::UnknownProperty {
            key: key.into(),
            section: section.to_string(),
            file: span.file.clone(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn missing_property(key: &str, section: &str, span: &Span) -> Self {
        Self::MissingProperty {
            key: key.to_string(),
            section: section.to_string(),
            file: span.file.clone(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn invalid_value(key: &str, value: impl Into<String>, expected: &str, span: &Span) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
            expected: expected.to_string(),
            file: span.file.clone(),
            line: span.line,
            column: span.column,
        }
    }
}
