//! Error types shared by the resolver, the converter and the edit forms.

use std::fmt;

/// Coarse classification of every failure (and warning) the crate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A string / forward-reference annotation was handed to the resolver
    InvalidAnnotation,
    /// The target constructor rejected the supplied arguments
    ConstructionError,
    /// No candidate type accepted a user-entered string
    NoMatchingType,
    /// A template names a type the registry does not know
    UnknownTypeReference,
    /// A template field is no longer part of the type's annotations
    StaleField,
    /// Input does not have the shape of an encoded template
    Malformed,
    /// Value has no JSON / script rendering
    Unencodable,
    /// Filesystem failure
    Io,
    /// Operation not allowed in the current editing context
    Usage,
}

/// Errors produced while expanding annotations into type sets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Forward references are not supported
    #[error(
        "annotation '{0}' is a string, not a type; register the referenced class and annotate with its handle"
    )]
    InvalidAnnotation(String),
}

impl ResolveError {
    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::InvalidAnnotation(_) => ErrorKind::InvalidAnnotation,
        }
    }
}

/// Errors produced by the converter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// Constructor rejected the arguments
    #[error("could not construct {class}: {reason}")]
    Construction {
        /// Qualified name of the class being built
        class: String,
        /// Reason reported by the constructor
        reason: String,
    },

    /// Type name could not be located in the registry
    #[error("unknown type reference '{0}'")]
    UnknownTypeReference(String),

    /// Input is not an encoded object-info tree
    #[error("malformed template: {0}")]
    Malformed(String),

    /// Value cannot be rendered as JSON or script
    #[error("cannot encode {0}")]
    Unencodable(String),

    /// Annotation resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ConvertError {
    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Construction { .. } => ErrorKind::ConstructionError,
            ConvertError::UnknownTypeReference(_) => ErrorKind::UnknownTypeReference,
            ConvertError::Malformed(_) => ErrorKind::Malformed,
            ConvertError::Unencodable(_) => ErrorKind::Unencodable,
            ConvertError::Resolve(e) => e.kind(),
        }
    }
}

/// Errors reported by the headless edit forms and sessions.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// User input matched none of the accepted types
    #[error("could not convert '{input}' to any of the accepted types: {accepted}")]
    NoMatchingType {
        /// The raw input
        input: String,
        /// Display names of the accepted types
        accepted: String,
    },

    /// String is neither castable nor one of the allowed literals
    #[error("'{input}' does not match any literal value; allowed literals: {allowed}")]
    InvalidLiteral {
        /// The raw input
        input: String,
        /// Allowed literal values
        allowed: String,
    },

    /// Type has no annotations and cannot be edited structurally
    #[error("{0} cannot be edited")]
    NotEditable(String),

    /// Saving is disabled for this editor
    #[error("saving is not allowed in this context")]
    SaveNotAllowed,

    /// A template for another class was loaded
    #[error("the selected template is not a {expected} template, it is for type {found}")]
    TemplateMismatch {
        /// Class edited by the form
        expected: String,
        /// Class named by the template
        found: String,
    },

    /// Selection-dependent operation without a usable selection
    #[error("{0}")]
    Selection(String),

    /// Session has no open editor
    #[error("no editor is open")]
    NoFrame,

    /// IO error while reading or writing templates
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while reading or writing templates
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Conversion failure
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Resolution failure
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl FormError {
    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormError::NoMatchingType { .. } | FormError::InvalidLiteral { .. } => {
                ErrorKind::NoMatchingType
            }
            FormError::NotEditable(_)
            | FormError::SaveNotAllowed
            | FormError::TemplateMismatch { .. }
            | FormError::Selection(_)
            | FormError::NoFrame => ErrorKind::Usage,
            FormError::Io(_) => ErrorKind::Io,
            FormError::Json(_) => ErrorKind::Malformed,
            FormError::Convert(e) => e.kind(),
            FormError::Resolve(e) => e.kind(),
        }
    }
}

/// Warning emitted when a template carries a field the type no longer accepts.
///
/// The field is dropped; decoding continues.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StaleField {
    /// Qualified class name
    pub class: String,
    /// Field that was dropped
    pub field: String,
}

impl StaleField {
    /// Warning classification
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::StaleField
    }
}

impl fmt::Display for StaleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter {} does not exist in {}, ignoring",
            self.field, self.class
        )
    }
}
