//! Idempotent tag reconciliation
//!
//! `quill-tags` owns the tag vocabulary shape and the diff-based
//! reconciliation algorithm that keeps a record's many-to-many tag
//! relations in sync with an incoming tag-name list. The entry-tagging and
//! media-tagging flows use it identically — each against its own
//! [`TagStore`] implementation.

pub mod error;
pub mod reconcile;
pub mod types;

pub use error::{Result, TagsError};
pub use reconcile::TagReconciler;
pub use types::{Tag, TagStore};

#[cfg(any(test, feature = "test-support"))]
pub use reconcile::memory::MemoryTagStore;
