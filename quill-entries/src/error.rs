//! Error types for entry validation and marshalling

use quill_common::{ContentTypeId, ErrorMap};
use thiserror::Error;

/// Result type for entry operations
pub type Result<T> = std::result::Result<T, EntriesError>;

/// Errors that can occur while validating or marshalling entry data
#[derive(Debug, Error)]
pub enum EntriesError {
    /// Submitted entry data failed one or more per-field rules. Referential
    /// failures (MEDIA/LINK ids not found in the project) surface here too —
    /// they are ordinary per-field messages, not a distinct kind.
    #[error("field validation failed: {errors}")]
    Validation { errors: ErrorMap },

    /// The content type an entry refers to no longer exists
    #[error("content type not found: {id}")]
    ContentTypeNotFound { id: ContentTypeId },

    /// A storage collaborator failed; propagated unchanged
    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EntriesError {
    /// Wrap an error map into a validation failure.
    pub fn validation(errors: ErrorMap) -> Self {
        Self::Validation { errors }
    }

    /// The per-field error map, when this is a validation failure.
    pub fn field_errors(&self) -> Option<&ErrorMap> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}
