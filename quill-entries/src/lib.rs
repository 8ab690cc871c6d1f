//! Entry field marshalling and dynamic schema-driven validation
//!
//! `quill-entries` owns the value side of the content model: the internal
//! `{name, fieldType, value}` storage shape, the two-way marshaller between
//! it and the flat external payload, and the validator that compiles a
//! content type's field list into per-field constraint sets.
//!
//! # Architecture
//!
//! - **Values only**: field schemas live in `quill-fields`; this crate
//!   consumes them
//! - **Collaborator seams**: referential checks and rehydration go through
//!   the [`store::ReferenceLoader`] trait — one implementation per record
//!   kind (media assets, entries), provided by the CRUD layer
//! - **Run-to-completion validation**: per-field checks are issued
//!   concurrently and every problem is reported at once
//! - **Transactional composition**: the caller wraps validate → marshal →
//!   persist → tag sync in one unit of work; nothing here retries or caches

pub mod error;
pub mod marshal;
pub mod store;
pub mod types;
pub mod validate;

pub use error::{EntriesError, Result};
pub use marshal::{to_external, to_internal};
pub use store::{
    definition_for_entry, ContentTypeLookup, LoadedRecord, MembershipLookup, ReferenceLoader,
};
pub use types::{Entry, EntryFieldValue, StoredValue};
pub use validate::{validate_project_member, Constraint, ConstraintSet, EntryValidator};
