use crate::item::{Item, LinkedItemRef};
use crate::milestone::Milestone;
use crate::store::{ScheduleBackend, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// A milestone together with the tasks and defects linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default)]
    pub linked_items: Vec<Item>,
}

impl ResolvedMilestone {
    pub fn new(milestone: Milestone, linked_items: Vec<Item>) -> Self {
        Self {
            milestone,
            linked_items,
        }
    }

    /// Linked items in the flat shape the edit form works with.
    pub fn linked_item_refs(&self) -> Vec<LinkedItemRef> {
        self.linked_items.iter().map(LinkedItemRef::from).collect()
    }
}

impl AsRef<Milestone> for ResolvedMilestone {
    fn as_ref(&self) -> &Milestone {
        &self.milestone
    }
}

impl std::ops::Deref for ResolvedMilestone {
    type Target = Milestone;
    fn deref(&self) -> &Self::Target {
        &self.milestone
    }
}

/// Attaches linked items to every milestone, one backend round trip per
/// milestone plus one for its items.
///
/// The first failing fetch aborts the whole resolution; nothing already
/// resolved is returned and nothing is retried.
pub fn resolve_linked_items<B>(
    backend: &B,
    milestones: Vec<Milestone>,
) -> StoreResult<Vec<ResolvedMilestone>>
where
    B: ScheduleBackend + ?Sized,
{
    let mut resolved = Vec::with_capacity(milestones.len());
    for milestone in milestones {
        let ids = backend.list_milestone_links(milestone.id).inspect_err(|err| {
            error!(milestone_id = milestone.id, "failed to fetch milestone links: {err}");
        })?;

        if ids.is_empty() {
            resolved.push(ResolvedMilestone::new(milestone, Vec::new()));
            continue;
        }

        let items = backend.list_items_by_ids(&ids).inspect_err(|err| {
            error!(milestone_id = milestone.id, "failed to fetch linked items: {err}");
        })?;
        debug!(
            milestone_id = milestone.id,
            linked = ids.len(),
            found = items.len(),
            "resolved milestone links"
        );
        resolved.push(ResolvedMilestone::new(milestone, items));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemId, ItemKind};
    use crate::persistence::InMemoryScheduleStore;
    use crate::milestone::{MilestoneFields, MilestoneId, MilestoneStatus, ProjectId};
    use crate::metadata::ProjectMetadata;
    use crate::store::StoreError;
    use crate::visibility::VisibilityLevel;
    use chrono::NaiveDate;
    use std::cell::Cell;

    /// Counts item lookups and can fail link lookups for one milestone.
    struct CountingBackend {
        inner: InMemoryScheduleStore,
        item_queries: Cell<usize>,
        failing_milestone: Option<MilestoneId>,
    }

    impl ScheduleBackend for CountingBackend {
        fn list_milestones(&self, project_id: ProjectId) -> StoreResult<Vec<Milestone>> {
            self.inner.list_milestones(project_id)
        }
        fn list_milestone_links(&self, milestone_id: MilestoneId) -> StoreResult<Vec<ItemId>> {
            if self.failing_milestone == Some(milestone_id) {
                return Err(StoreError::InvalidData("backend unavailable".into()));
            }
            self.inner.list_milestone_links(milestone_id)
        }
        fn list_items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
            self.item_queries.set(self.item_queries.get() + 1);
            self.inner.list_items_by_ids(ids)
        }
        fn list_items(&self) -> StoreResult<Vec<Item>> {
            self.inner.list_items()
        }
        fn create_milestone(
            &self,
            project_id: ProjectId,
            fields: &MilestoneFields,
            created_by: &str,
        ) -> StoreResult<Milestone> {
            self.inner.create_milestone(project_id, fields, created_by)
        }
        fn update_milestone(&self, id: MilestoneId, f: &MilestoneFields) -> StoreResult<Milestone> {
            self.inner.update_milestone(id, f)
        }
        fn set_milestone_status(
            &self,
            id: MilestoneId,
            status: MilestoneStatus,
        ) -> StoreResult<Milestone> {
            self.inner.set_milestone_status(id, status)
        }
        fn delete_milestone(&self, id: MilestoneId) -> StoreResult<()> {
            self.inner.delete_milestone(id)
        }
        fn replace_milestone_links(&self, id: MilestoneId, ids: &[ItemId]) -> StoreResult<()> {
            self.inner.replace_milestone_links(id, ids)
        }
        fn set_visibility(&self, id: MilestoneId, level: VisibilityLevel) -> StoreResult<()> {
            self.inner.set_visibility(id, level)
        }
        fn visibility(&self, id: MilestoneId) -> StoreResult<Option<VisibilityLevel>> {
            self.inner.visibility(id)
        }
        fn load_project(&self, id: ProjectId) -> StoreResult<Option<ProjectMetadata>> {
            self.inner.load_project(id)
        }
        fn save_project(&self, id: ProjectId, m: &ProjectMetadata) -> StoreResult<()> {
            self.inner.save_project(id, m)
        }
    }

    fn counting_backend(failing_milestone: Option<MilestoneId>) -> CountingBackend {
        let inner = InMemoryScheduleStore::new();
        inner.upsert_item(Item::new(10, ItemKind::Task, "Install rebar"));
        inner.upsert_item(Item::new(11, ItemKind::Defect, "Honeycombing"));
        let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let a = inner
            .create_milestone(1, &MilestoneFields::new("Slab poured", start), "pm")
            .unwrap();
        inner
            .create_milestone(1, &MilestoneFields::new("Inspection", start), "pm")
            .unwrap();
        inner.replace_milestone_links(a.id, &[10, 11]).unwrap();
        CountingBackend {
            inner,
            item_queries: Cell::new(0),
            failing_milestone,
        }
    }

    #[test]
    fn unlinked_milestones_skip_item_lookup() {
        let backend = counting_backend(None);
        let milestones = backend.list_milestones(1).unwrap();
        let resolved = resolve_linked_items(&backend, milestones).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].linked_items.len(), 2);
        assert!(resolved[1].linked_items.is_empty());
        assert_eq!(backend.item_queries.get(), 1);
    }

    #[test]
    fn first_failure_aborts_resolution() {
        let backend = counting_backend(Some(2));
        let milestones = backend.list_milestones(1).unwrap();
        let err = resolve_linked_items(&backend, milestones).unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[test]
    fn empty_input_resolves_to_empty() {
        let backend = counting_backend(None);
        assert!(resolve_linked_items(&backend, Vec::new()).unwrap().is_empty());
        assert_eq!(backend.item_queries.get(), 0);
    }
}
