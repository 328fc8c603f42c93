//! Diagnostic types for error reporting.
//!
//! Two families live here:
//!
//! - [`CompilerError`]: fail-fast errors. A structurally broken file (bad YAML,
//!   unknown key, missing required key) stops loading of that one file.
//! - [`ModelError`]: collected diagnostics produced while binding references.
//!   They are plain values; any one of error severity vetoes a batch commit.

mod error;
mod model_error;
mod span;

pub use error::CompilerError;
pub use model_error::{ModelElement, ModelError, ModelErrorKind, Severity};
pub use span::{Reference, Span};
