use crate::item::{Item, ItemId};
use crate::metadata::ProjectMetadata;
use crate::milestone::{Milestone, MilestoneFields, MilestoneId, MilestoneStatus, ProjectId};
use crate::store::{ScheduleBackend, StoreError, StoreResult};
use crate::visibility::VisibilityLevel;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct Tables {
    next_milestone_id: MilestoneId,
    milestones: BTreeMap<MilestoneId, Milestone>,
    links: HashMap<MilestoneId, Vec<ItemId>>,
    items: BTreeMap<ItemId, Item>,
    visibility: HashMap<MilestoneId, VisibilityLevel>,
    projects: HashMap<ProjectId, ProjectMetadata>,
}

/// Process-local backend. Used by the CLI, JSON snapshots and tests.
#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    tables: Mutex<Tables>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_item(&self, item: Item) {
        self.tables.lock().items.insert(item.id, item);
    }

    /// Inserts a milestone with its id and timestamps kept as given.
    pub(crate) fn restore_milestone(&self, milestone: Milestone) {
        let mut tables = self.tables.lock();
        tables.next_milestone_id = tables.next_milestone_id.max(milestone.id);
        tables.milestones.insert(milestone.id, milestone);
    }
}

fn sort_by_start(milestones: &mut [Milestone]) {
    milestones.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
}

impl ScheduleBackend for InMemoryScheduleStore {
    fn list_milestones(&self, project_id: ProjectId) -> StoreResult<Vec<Milestone>> {
        let tables = self.tables.lock();
        let mut milestones: Vec<Milestone> = tables
            .milestones
            .values()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        sort_by_start(&mut milestones);
        Ok(milestones)
    }

    fn list_milestone_links(&self, milestone_id: MilestoneId) -> StoreResult<Vec<ItemId>> {
        let tables = self.tables.lock();
        Ok(tables.links.get(&milestone_id).cloned().unwrap_or_default())
    }

    fn list_items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        let tables = self.tables.lock();
        Ok(tables
            .items
            .values()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect())
    }

    fn list_items(&self) -> StoreResult<Vec<Item>> {
        Ok(self.tables.lock().items.values().cloned().collect())
    }

    fn create_milestone(
        &self,
        project_id: ProjectId,
        fields: &MilestoneFields,
        created_by: &str,
    ) -> StoreResult<Milestone> {
        let mut tables = self.tables.lock();
        tables.next_milestone_id += 1;
        let milestone = Milestone {
            id: tables.next_milestone_id,
            project_id,
            title: fields.title.clone(),
            start_date: fields.start_date,
            end_date: fields.end_date,
            description: fields.description.clone(),
            color: fields.color.clone(),
            event_type: fields.event_type,
            status: MilestoneStatus::Scheduled,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        tables.milestones.insert(milestone.id, milestone.clone());
        Ok(milestone)
    }

    fn update_milestone(
        &self,
        milestone_id: MilestoneId,
        fields: &MilestoneFields,
    ) -> StoreResult<Milestone> {
        let mut tables = self.tables.lock();
        let milestone = tables
            .milestones
            .get_mut(&milestone_id)
            .ok_or_else(|| StoreError::milestone_not_found(milestone_id))?;
        milestone.apply_fields(fields);
        Ok(milestone.clone())
    }

    fn set_milestone_status(
        &self,
        milestone_id: MilestoneId,
        status: MilestoneStatus,
    ) -> StoreResult<Milestone> {
        let mut tables = self.tables.lock();
        let milestone = tables
            .milestones
            .get_mut(&milestone_id)
            .ok_or_else(|| StoreError::milestone_not_found(milestone_id))?;
        milestone.status = status;
        Ok(milestone.clone())
    }

    fn delete_milestone(&self, milestone_id: MilestoneId) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if tables.milestones.remove(&milestone_id).is_none() {
            return Err(StoreError::milestone_not_found(milestone_id));
        }
        tables.links.remove(&milestone_id);
        tables.visibility.remove(&milestone_id);
        Ok(())
    }

    fn replace_milestone_links(
        &self,
        milestone_id: MilestoneId,
        item_ids: &[ItemId],
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if !tables.milestones.contains_key(&milestone_id) {
            return Err(StoreError::milestone_not_found(milestone_id));
        }
        let mut rows: Vec<ItemId> = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            if !rows.contains(id) {
                rows.push(*id);
            }
        }
        tables.links.insert(milestone_id, rows);
        Ok(())
    }

    fn set_visibility(
        &self,
        milestone_id: MilestoneId,
        level: VisibilityLevel,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if !tables.milestones.contains_key(&milestone_id) {
            return Err(StoreError::milestone_not_found(milestone_id));
        }
        tables.visibility.insert(milestone_id, level);
        Ok(())
    }

    fn visibility(&self, milestone_id: MilestoneId) -> StoreResult<Option<VisibilityLevel>> {
        Ok(self.tables.lock().visibility.get(&milestone_id).copied())
    }

    fn load_project(&self, project_id: ProjectId) -> StoreResult<Option<ProjectMetadata>> {
        Ok(self.tables.lock().projects.get(&project_id).cloned())
    }

    fn save_project(&self, project_id: ProjectId, metadata: &ProjectMetadata) -> StoreResult<()> {
        self.tables
            .lock()
            .projects
            .insert(project_id, metadata.clone());
        Ok(())
    }
}
