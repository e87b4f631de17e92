use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// Errors raised while converting between wire trees, dynamic objects and
/// API payloads.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Schema mismatch: expected {expected}, got {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Attribute '{name}' is not declared by {object}")]
    UnknownAttribute { object: String, name: String },

    #[error("Malformed wire tree: {0}")]
    MalformedTree(String),

    #[error("Invalid {object} value: {diagnostics}")]
    InvalidObject {
        object: String,
        diagnostics: Diagnostics,
    },

    #[error("Attribute '{path}' is unknown and cannot be persisted")]
    UnknownInSnapshot { path: String },

    #[error("Invalid JSON: {0}")]
    Json(String),
}

impl CodecError {
    pub(crate) fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        CodecError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
