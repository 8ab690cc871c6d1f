//! Shared primitives for the Quill content core
//!
//! Strongly-typed ULID identifier newtypes (one per entity kind, so a
//! `MediaId` can never be handed to an API expecting an `EntryId`) and the
//! field-name-keyed error map used by both structural and entry validation.

pub mod error_map;
pub mod ids;

pub use error_map::ErrorMap;
pub use ids::{ContentTypeId, EntryId, MediaId, ProjectId, TagId, UserId};
