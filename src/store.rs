use crate::item::{Item, ItemId};
use crate::metadata::ProjectMetadata;
use crate::milestone::{Milestone, MilestoneFields, MilestoneId, MilestoneStatus, ProjectId};
use crate::visibility::VisibilityLevel;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub fn milestone_not_found(id: MilestoneId) -> Self {
        StoreError::NotFound {
            entity: "milestone",
            id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Data access the schedule module needs from the hosted backend.
///
/// Implementations synchronize internally so a single instance can be shared
/// behind an `Arc`. Writes are last-write-wins.
pub trait ScheduleBackend {
    /// Milestones of a project, ascending by start date (ties by id).
    fn list_milestones(&self, project_id: ProjectId) -> StoreResult<Vec<Milestone>>;

    fn list_milestone_links(&self, milestone_id: MilestoneId) -> StoreResult<Vec<ItemId>>;

    /// Unknown ids are skipped.
    fn list_items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>>;

    /// Every task and defect the backend holds, linked or not, ascending by id.
    fn list_items(&self) -> StoreResult<Vec<Item>>;

    fn create_milestone(
        &self,
        project_id: ProjectId,
        fields: &MilestoneFields,
        created_by: &str,
    ) -> StoreResult<Milestone>;

    fn update_milestone(
        &self,
        milestone_id: MilestoneId,
        fields: &MilestoneFields,
    ) -> StoreResult<Milestone>;

    fn set_milestone_status(
        &self,
        milestone_id: MilestoneId,
        status: MilestoneStatus,
    ) -> StoreResult<Milestone>;

    /// Removes the milestone together with its links and visibility override.
    fn delete_milestone(&self, milestone_id: MilestoneId) -> StoreResult<()>;

    /// Deletes every link of the milestone, then inserts `item_ids`.
    fn replace_milestone_links(
        &self,
        milestone_id: MilestoneId,
        item_ids: &[ItemId],
    ) -> StoreResult<()>;

    fn set_visibility(&self, milestone_id: MilestoneId, level: VisibilityLevel)
    -> StoreResult<()>;

    fn visibility(&self, milestone_id: MilestoneId) -> StoreResult<Option<VisibilityLevel>>;

    fn load_project(&self, project_id: ProjectId) -> StoreResult<Option<ProjectMetadata>>;

    fn save_project(&self, project_id: ProjectId, metadata: &ProjectMetadata) -> StoreResult<()>;
}
