//! Tag types and the storage collaborator contract

use async_trait::async_trait;
use quill_common::{ProjectId, TagId};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::Result;

/// A project-scoped tag, unique on `(project_id, name)`.
///
/// Entry tags and media tags are two disjoint vocabularies with this same
/// shape; the [`TagStore`] instance decides which vocabulary a reconciler
/// operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub project_id: ProjectId,
    pub name: String,
}

impl Tag {
    /// Create a tag with a fresh id.
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id: TagId::new(),
            project_id,
            name: name.into(),
        }
    }
}

/// Storage contract for one tag vocabulary and its many-to-many relation
/// table. Implementations must never produce duplicate `(record, tag)`
/// pairs; relate/unrelate are called with disjoint id sets and may run
/// concurrently.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Tags in `project` whose name is in `names`.
    async fn find_by_names(&self, project: ProjectId, names: &[String]) -> Result<Vec<Tag>>;

    /// Create a tag scoped to `project`.
    async fn create(&self, project: ProjectId, name: &str) -> Result<Tag>;

    /// Tags currently related to `record`.
    async fn related_tags(&self, record: Ulid) -> Result<Vec<Tag>>;

    /// Add relations between `record` and every tag in `tags`.
    async fn relate(&self, record: Ulid, tags: &[TagId]) -> Result<()>;

    /// Remove relations between `record` and every tag in `tags`.
    async fn unrelate(&self, record: Ulid, tags: &[TagId]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_serializes_with_camel_case_project_key() {
        let tag = Tag::new(ProjectId::new(), "rust");
        let value = serde_json::to_value(&tag).unwrap();
        assert!(value.get("projectId").is_some());
        assert_eq!(value["name"], "rust");
    }
}
