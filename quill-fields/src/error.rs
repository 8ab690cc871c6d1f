//! Error types for the field schema model

use quill_common::ErrorMap;
use thiserror::Error;

/// Result type for field-schema operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur while compiling or validating content-type definitions
#[derive(Debug, Error)]
pub enum FieldsError {
    /// The definition itself is malformed: bad field grammar, duplicate
    /// names, unknown fieldType. Carries one message list per field name.
    #[error("structural validation failed: {errors}")]
    Structural { errors: ErrorMap },

    /// The compiled structural schema could not be built into a validator
    #[error("schema compile error: {message}")]
    SchemaCompile { message: String },

    /// Definition JSON could not be deserialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FieldsError {
    /// Wrap an error map into a structural failure.
    pub fn structural(errors: ErrorMap) -> Self {
        Self::Structural { errors }
    }

    /// The per-field error map, when this is a structural failure.
    pub fn field_errors(&self) -> Option<&ErrorMap> {
        match self {
            Self::Structural { errors } => Some(errors),
            _ => None,
        }
    }
}
