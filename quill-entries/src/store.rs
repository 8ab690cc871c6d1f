//! Storage collaborator contracts
//!
//! The entry core never talks to a database directly. Referential
//! validation and rehydration go through these traits; the CRUD layer
//! provides implementations for the two record kinds (media assets and
//! entries) and composes everything into one transaction.

use async_trait::async_trait;
use quill_common::{ContentTypeId, ProjectId, UserId};
use quill_fields::ContentTypeDefinition;
use serde_json::Value;
use ulid::Ulid;

use crate::error::{EntriesError, Result};
use crate::types::Entry;

/// A record fetched by id while rehydrating a referential field. `data` is
/// the record's external JSON shape, id included.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
    pub id: Ulid,
    pub data: Value,
}

impl LoadedRecord {
    pub fn new(id: Ulid, data: Value) -> Self {
        Self { id, data }
    }
}

/// Batched lookup over one record kind. Two independent implementations
/// back the MEDIA and LINK field kinds.
#[async_trait]
pub trait ReferenceLoader: Send + Sync {
    /// How many of `ids` exist and belong to `project`. Used for the
    /// referential-integrity check: the count must equal the number of
    /// distinct submitted ids.
    async fn count_in_project(&self, project: ProjectId, ids: &[Ulid]) -> Result<usize>;

    /// Fetch records by id, one batched query. Makes no ordering guarantee
    /// and silently omits ids with no record.
    async fn fetch_by_ids(&self, ids: &[Ulid]) -> Result<Vec<LoadedRecord>>;
}

/// Project-membership lookup, used by the membership validator.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    /// Whether `user` is an active member of `project`, optionally holding
    /// at least the given role.
    async fn is_active_member(
        &self,
        user: UserId,
        project: ProjectId,
        role: Option<&str>,
    ) -> Result<bool>;
}

/// Content-type definition lookup by id.
#[async_trait]
pub trait ContentTypeLookup: Send + Sync {
    async fn find_by_id(&self, id: ContentTypeId) -> Result<Option<ContentTypeDefinition>>;
}

/// Resolve the definition an entry conforms to. Fails with
/// [`EntriesError::ContentTypeNotFound`] when the content type has been
/// deleted out from under the entry.
pub async fn definition_for_entry(
    lookup: &dyn ContentTypeLookup,
    entry: &Entry,
) -> Result<ContentTypeDefinition> {
    lookup
        .find_by_id(entry.content_type_id)
        .await?
        .ok_or(EntriesError::ContentTypeNotFound {
            id: entry.content_type_id,
        })
}
