//! File-level aliases (re-exports).

use crate::diagnostic::{Reference, Span};

/// Re-export of classes and endpoints from a dependency into the current file.
#[derive(Debug, Clone)]
pub struct Alias {
    pub file: Reference,
    pub classes: Vec<Reference>,
    pub endpoints: Vec<Reference>,
    pub span: Span,
}
