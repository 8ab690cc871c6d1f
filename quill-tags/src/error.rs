//! Error types for tag reconciliation

use thiserror::Error;

/// Result type for tag operations
pub type Result<T> = std::result::Result<T, TagsError>;

/// Errors that can occur while reconciling tags.
///
/// Reconciliation defines no failure modes of its own — get-or-create,
/// relate, and unrelate either succeed or propagate the underlying storage
/// error unchanged, and the caller treats that as fatal to the transaction.
#[derive(Debug, Error)]
pub enum TagsError {
    /// A storage collaborator failed; propagated unchanged
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
