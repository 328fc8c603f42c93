//! Collected diagnostics produced while binding references.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Reference;

/// Severity of a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Every diagnostic the resolver can produce, with its stable code.
///
/// The codes are what the `nowarn` configuration list refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelErrorKind {
    /// A `uses` entry names a file that is not in the model.
    #[serde(rename = "TMD0001")]
    MissingFile,
    /// An `extends`, association, composition or alias target class is unknown.
    #[serde(rename = "TMD0002")]
    MissingClass,
    /// A domain reference is unknown.
    #[serde(rename = "TMD0003")]
    MissingDomain,
    /// A class decorator reference is unknown.
    #[serde(rename = "TMD0004")]
    MissingDecorator,
    /// An association targets a class without exactly one primary key.
    #[serde(rename = "TMD0005")]
    AssociationPrimaryKey,
    /// An alias include/exclude entry names a property the target lacks.
    #[serde(rename = "TMD0006")]
    MissingAliasProperty,
    /// A file-level alias names a file outside the file's dependencies.
    #[serde(rename = "TMD0007")]
    MissingAliasFile,
    /// A file-level alias names a class the aliased file does not declare.
    #[serde(rename = "TMD0008")]
    MissingAliasClass,
    /// A file-level alias names an endpoint the aliased file does not declare.
    #[serde(rename = "TMD0009")]
    MissingAliasEndpoint,
    /// A class declares several primary keys while composite keys are disallowed.
    #[serde(rename = "TMD0010")]
    CompositePrimaryKey,
    /// A property name appears twice in a class or its inheritance chain.
    #[serde(rename = "TMD0011")]
    DuplicateProperty,
    /// `orderProperty` / `defaultProperty` names a property the class lacks.
    #[serde(rename = "TMD0012")]
    MissingClassProperty,
    /// The `uses` graph of the affected files contains a cycle.
    #[serde(rename = "TMD0013")]
    CircularDependency,
    /// A `uses` entry is never referenced.
    #[serde(rename = "TMD9001")]
    UnusedUse,
    /// The `uses` list is not sorted by name.
    #[serde(rename = "TMD9002")]
    MisorderedUse,
}

impl ModelErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingFile => "TMD0001",
            Self::MissingClass => "TMD0002",
            Self::MissingDomain => "TMD0003",
            Self::MissingDecorator => "TMD0004",
            Self::AssociationPrimaryKey => "TMD0005",
            Self::MissingAliasProperty => "TMD0006",
            Self::MissingAliasFile => "TMD0007",
            Self::MissingAliasClass => "TMD0008",
            Self::MissingAliasEndpoint => "TMD0009",
            Self::CompositePrimaryKey => "TMD0010",
            Self::DuplicateProperty => "TMD0011",
            Self::MissingClassProperty => "TMD0012",
            Self::CircularDependency => "TMD0013",
            Self::UnusedUse => "TMD9001",
            Self::MisorderedUse => "TMD9002",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::UnusedUse | Self::MisorderedUse => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// The model element a diagnostic is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModelElement {
    File { name: String },
    Class { name: String },
    Property { owner: String, name: String },
    Endpoint { name: String },
    Domain { name: String },
    Alias { file: String },
}

impl fmt::Display for ModelElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { name } => write!(f, "file '{name}'"),
            Self::Class { name } => write!(f, "class '{name}'"),
            Self::Property { owner, name } => write!(f, "property '{owner}.{name}'"),
            Self::Endpoint { name } => write!(f, "endpoint '{name}'"),
            Self::Domain { name } => write!(f, "domain '{name}'"),
            Self::Alias { file } => write!(f, "alias of '{file}'"),
        }
    }
}

/// A diagnostic collected during resolution. Never mutates the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub severity: Severity,
    /// Logical name of the file the diagnostic belongs to.
    pub file: String,
    pub element: ModelElement,
    pub message: String,
    /// Where the offending reference was written, when there is one.
    pub reference: Option<Reference>,
}

impl ModelError {
    pub fn new(
        kind: ModelErrorKind,
        file: impl Into<String>,
        element: ModelElement,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            file: file.into(),
            element,
            message: message.into(),
            reference: None,
        }
    }

    /// Attaches the source reference used for the diagnostic's location.
    pub fn at(mut self, reference: &Reference) -> Self {
        self.reference = Some(reference.clone());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(reference) => write!(f, "[{}] ", reference.span)?,
            None => write!(f, "[{}] ", self.file)?,
        }
        write!(f, "{} ({})", self.message, self.kind.code())
    }
}
