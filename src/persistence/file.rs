use super::memory::InMemoryScheduleStore;
use crate::item::{Item, ItemId};
use crate::metadata::ProjectMetadata;
use crate::milestone::{Milestone, MilestoneId, ProjectId};
use crate::store::{ScheduleBackend, StoreError, StoreResult};
use crate::visibility::VisibilityLevel;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::Path;

/// Everything the schedule module knows about one project, as a JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub project_id: ProjectId,
    pub metadata: ProjectMetadata,
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub links: BTreeMap<MilestoneId, Vec<ItemId>>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub visibility: BTreeMap<MilestoneId, VisibilityLevel>,
}

impl ScheduleSnapshot {
    pub fn capture<B>(backend: &B, project_id: ProjectId) -> StoreResult<Self>
    where
        B: ScheduleBackend + ?Sized,
    {
        let metadata = backend.load_project(project_id)?.unwrap_or_default();
        let milestones = backend.list_milestones(project_id)?;

        let mut links = BTreeMap::new();
        let mut visibility = BTreeMap::new();
        for milestone in &milestones {
            let ids = backend.list_milestone_links(milestone.id)?;
            if !ids.is_empty() {
                links.insert(milestone.id, ids);
            }
            if let Some(level) = backend.visibility(milestone.id)? {
                visibility.insert(milestone.id, level);
            }
        }
        let items = backend.list_items()?;

        Ok(Self {
            project_id,
            metadata,
            milestones,
            links,
            items,
            visibility,
        })
    }

    pub fn validate(&self) -> StoreResult<()> {
        let mut ids = HashSet::with_capacity(self.milestones.len());
        for milestone in &self.milestones {
            if !ids.insert(milestone.id) {
                return Err(StoreError::InvalidData(format!(
                    "duplicate milestone id {}",
                    milestone.id
                )));
            }
            if milestone.project_id != self.project_id {
                return Err(StoreError::InvalidData(format!(
                    "milestone {} belongs to project {}, expected {}",
                    milestone.id, milestone.project_id, self.project_id
                )));
            }
            milestone.fields().validate().map_err(|err| {
                StoreError::InvalidData(format!("milestone {}: {err}", milestone.id))
            })?;
        }
        for milestone_id in self.links.keys().chain(self.visibility.keys()) {
            if !ids.contains(milestone_id) {
                return Err(StoreError::InvalidData(format!(
                    "reference to unknown milestone {milestone_id}"
                )));
            }
        }
        Ok(())
    }

    pub fn into_store(self) -> StoreResult<InMemoryScheduleStore> {
        self.validate()?;
        let store = InMemoryScheduleStore::new();
        store.save_project(self.project_id, &self.metadata)?;
        for item in self.items {
            store.upsert_item(item);
        }
        for milestone in self.milestones {
            store.restore_milestone(milestone);
        }
        for (milestone_id, item_ids) in &self.links {
            store.replace_milestone_links(*milestone_id, item_ids)?;
        }
        for (milestone_id, level) in &self.visibility {
            store.set_visibility(*milestone_id, *level)?;
        }
        Ok(store)
    }
}

pub fn save_schedule_to_json<B, P>(backend: &B, project_id: ProjectId, path: P) -> StoreResult<()>
where
    B: ScheduleBackend + ?Sized,
    P: AsRef<Path>,
{
    let snapshot = ScheduleSnapshot::capture(backend, project_id)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> StoreResult<ScheduleSnapshot> {
    let file = File::open(path)?;
    let snapshot: ScheduleSnapshot = serde_json::from_reader(file)?;
    snapshot.validate()?;
    Ok(snapshot)
}
