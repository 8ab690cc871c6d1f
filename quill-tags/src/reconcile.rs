//! Idempotent many-to-many tag synchronization
//!
//! One algorithm, two vocabularies: the entry-tagging and media-tagging
//! flows both drive a [`TagReconciler`] over their own [`TagStore`]. The
//! reconciler diffs by tag-id set, touches only the delta, and creates
//! missing tag rows on demand — never deleting any.

use std::collections::{HashMap, HashSet};

use quill_common::{ProjectId, TagId};
use tracing::debug;
use ulid::Ulid;

use crate::error::Result;
use crate::types::{Tag, TagStore};

/// Reconciles a record's tag relations with an incoming tag-name list.
pub struct TagReconciler<'a> {
    store: &'a dyn TagStore,
}

impl<'a> TagReconciler<'a> {
    pub fn new(store: &'a dyn TagStore) -> Self {
        Self { store }
    }

    /// Resolve every requested name to a Tag, creating the ones that do not
    /// exist yet in `project`. Requested names are de-duplicated first; the
    /// result carries one Tag per distinct name, in request order, and is
    /// stable regardless of call order or pre-existing rows.
    pub async fn bulk_get_or_create(
        &self,
        project: ProjectId,
        names: &[String],
    ) -> Result<Vec<Tag>> {
        let mut requested = Vec::new();
        let mut seen = HashSet::new();
        for name in names {
            if seen.insert(name.as_str()) {
                requested.push(name.clone());
            }
        }
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.store.find_by_names(project, &requested).await?;
        let mut by_name: HashMap<String, Tag> = existing
            .into_iter()
            .map(|tag| (tag.name.clone(), tag))
            .collect();

        let mut resolved = Vec::with_capacity(requested.len());
        for name in requested {
            let tag = match by_name.remove(&name) {
                Some(tag) => tag,
                None => {
                    debug!(%project, name = %name, "creating missing tag");
                    self.store.create(project, &name).await?
                }
            };
            resolved.push(tag);
        }
        Ok(resolved)
    }

    /// Make `incoming` the record's canonical tag set.
    ///
    /// Computes the relate/unrelate delta by id-set difference and issues
    /// both store operations concurrently — they touch disjoint id sets, so
    /// no ordering is needed. Calling this twice with the same input is a
    /// no-op on the second call.
    pub async fn set_tags(&self, record: Ulid, incoming: &[Tag]) -> Result<Vec<Tag>> {
        let current = self.store.related_tags(record).await?;

        let current_ids: HashSet<TagId> = current.iter().map(|t| t.id).collect();
        let incoming_ids: HashSet<TagId> = incoming.iter().map(|t| t.id).collect();

        let to_unrelate: Vec<TagId> = current
            .iter()
            .map(|t| t.id)
            .filter(|id| !incoming_ids.contains(id))
            .collect();
        let to_relate: Vec<TagId> = incoming
            .iter()
            .map(|t| t.id)
            .filter(|id| !current_ids.contains(id))
            .collect();

        let relate = async {
            if to_relate.is_empty() {
                Ok(())
            } else {
                self.store.relate(record, &to_relate).await
            }
        };
        let unrelate = async {
            if to_unrelate.is_empty() {
                Ok(())
            } else {
                self.store.unrelate(record, &to_unrelate).await
            }
        };
        let (related, unrelated) = tokio::join!(relate, unrelate);
        related?;
        unrelated?;

        debug!(
            %record,
            related = to_relate.len(),
            unrelated = to_unrelate.len(),
            "reconciled tag relations"
        );
        Ok(incoming.to_vec())
    }
}

/// In-memory `TagStore` for tests. Counts relate/unrelate calls so tests
/// can assert the no-op property of repeated reconciliation.
#[cfg(any(test, feature = "test-support"))]
pub mod memory {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct State {
        tags: Vec<Tag>,
        relations: HashMap<Ulid, HashSet<TagId>>,
        relate_calls: usize,
        unrelate_calls: usize,
    }

    /// One vocabulary's worth of tags and relations, behind a mutex.
    #[derive(Default)]
    pub struct MemoryTagStore {
        state: Mutex<State>,
    }

    impl MemoryTagStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// How many relate/unrelate calls the store has seen.
        pub fn mutation_calls(&self) -> (usize, usize) {
            let state = self.state.lock().unwrap();
            (state.relate_calls, state.unrelate_calls)
        }

        /// The tag names currently related to `record`, sorted.
        pub fn related_names(&self, record: Ulid) -> Vec<String> {
            let state = self.state.lock().unwrap();
            let Some(ids) = state.relations.get(&record) else {
                return Vec::new();
            };
            let mut names: Vec<String> = state
                .tags
                .iter()
                .filter(|t| ids.contains(&t.id))
                .map(|t| t.name.clone())
                .collect();
            names.sort();
            names
        }

        /// Total number of tag rows across all projects.
        pub fn tag_count(&self) -> usize {
            self.state.lock().unwrap().tags.len()
        }
    }

    #[async_trait]
    impl TagStore for MemoryTagStore {
        async fn find_by_names(&self, project: ProjectId, names: &[String]) -> Result<Vec<Tag>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .tags
                .iter()
                .filter(|t| t.project_id == project && names.contains(&t.name))
                .cloned()
                .collect())
        }

        async fn create(&self, project: ProjectId, name: &str) -> Result<Tag> {
            let mut state = self.state.lock().unwrap();
            let tag = Tag::new(project, name);
            state.tags.push(tag.clone());
            Ok(tag)
        }

        async fn related_tags(&self, record: Ulid) -> Result<Vec<Tag>> {
            let state = self.state.lock().unwrap();
            let Some(ids) = state.relations.get(&record) else {
                return Ok(Vec::new());
            };
            Ok(state
                .tags
                .iter()
                .filter(|t| ids.contains(&t.id))
                .cloned()
                .collect())
        }

        async fn relate(&self, record: Ulid, tags: &[TagId]) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.relate_calls += 1;
            let related = state.relations.entry(record).or_default();
            // HashSet keeps the (record, tag) relation duplicate-free
            related.extend(tags.iter().copied());
            Ok(())
        }

        async fn unrelate(&self, record: Ulid, tags: &[TagId]) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.unrelate_calls += 1;
            if let Some(related) = state.relations.get_mut(&record) {
                for tag in tags {
                    related.remove(tag);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryTagStore;
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn bulk_get_or_create_creates_missing_and_reuses_existing() {
        let store = MemoryTagStore::new();
        let project = ProjectId::new();
        let reconciler = TagReconciler::new(&store);

        let first = reconciler
            .bulk_get_or_create(project, &names(&["rust", "cms"]))
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(store.tag_count(), 2);

        let second = reconciler
            .bulk_get_or_create(project, &names(&["cms", "backend"]))
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(store.tag_count(), 3);

        // the shared name resolved to the same row
        let cms_first = first.iter().find(|t| t.name == "cms").unwrap();
        let cms_second = second.iter().find(|t| t.name == "cms").unwrap();
        assert_eq!(cms_first.id, cms_second.id);
    }

    #[tokio::test]
    async fn duplicate_requested_names_collapse() {
        let store = MemoryTagStore::new();
        let project = ProjectId::new();
        let reconciler = TagReconciler::new(&store);

        let tags = reconciler
            .bulk_get_or_create(project, &names(&["a", "a", "b", "a"]))
            .await
            .unwrap();
        let got: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(got, ["a", "b"]);
        assert_eq!(store.tag_count(), 2);
    }

    #[tokio::test]
    async fn same_name_in_two_projects_creates_two_rows() {
        let store = MemoryTagStore::new();
        let reconciler = TagReconciler::new(&store);
        let (p1, p2) = (ProjectId::new(), ProjectId::new());

        let a = reconciler.bulk_get_or_create(p1, &names(&["rust"])).await.unwrap();
        let b = reconciler.bulk_get_or_create(p2, &names(&["rust"])).await.unwrap();
        assert_ne!(a[0].id, b[0].id);
        assert_eq!(store.tag_count(), 2);
    }

    #[tokio::test]
    async fn set_tags_relates_and_unrelates_the_delta() {
        let store = MemoryTagStore::new();
        let project = ProjectId::new();
        let reconciler = TagReconciler::new(&store);
        let record = Ulid::new();

        let ab = reconciler
            .bulk_get_or_create(project, &names(&["a", "b"]))
            .await
            .unwrap();
        reconciler.set_tags(record, &ab).await.unwrap();
        assert_eq!(store.related_names(record), ["a", "b"]);

        let bc = reconciler
            .bulk_get_or_create(project, &names(&["b", "c"]))
            .await
            .unwrap();
        reconciler.set_tags(record, &bc).await.unwrap();
        assert_eq!(store.related_names(record), ["b", "c"]);
    }

    #[tokio::test]
    async fn second_identical_call_is_a_no_op() {
        let store = MemoryTagStore::new();
        let project = ProjectId::new();
        let reconciler = TagReconciler::new(&store);
        let record = Ulid::new();

        let tags = reconciler
            .bulk_get_or_create(project, &names(&["a", "b"]))
            .await
            .unwrap();
        reconciler.set_tags(record, &tags).await.unwrap();
        let calls_after_first = store.mutation_calls();

        let returned = reconciler.set_tags(record, &tags).await.unwrap();
        assert_eq!(store.mutation_calls(), calls_after_first);
        assert_eq!(returned, tags);
        assert_eq!(store.related_names(record), ["a", "b"]);
    }

    #[tokio::test]
    async fn clearing_tags_unrelates_everything() {
        let store = MemoryTagStore::new();
        let project = ProjectId::new();
        let reconciler = TagReconciler::new(&store);
        let record = Ulid::new();

        let tags = reconciler
            .bulk_get_or_create(project, &names(&["a"]))
            .await
            .unwrap();
        reconciler.set_tags(record, &tags).await.unwrap();
        reconciler.set_tags(record, &[]).await.unwrap();
        assert!(store.related_names(record).is_empty());
    }
}
