use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub type ItemId = i64;

/// Whether a linked record comes from the task list or the defect register.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Task,
    Defect,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStatus {
    Open,
    #[default]
    Todo,
    InProgress,
    InReview,
    Blocked,
    Done,
    Resolved,
    Closed,
}

impl ItemStatus {
    /// Only `done` tasks and `resolved` defects count towards milestone progress.
    pub fn counts_as_complete(self) -> bool {
        matches!(self, ItemStatus::Done | ItemStatus::Resolved)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A task or defect as the schedule module sees it. Owned by the task
/// subsystem; the schedule only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub kind: ItemKind,
    pub title: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub priority: ItemPriority,
    /// Trade or category label, e.g. `electrical` or `drywall`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
}

impl Item {
    pub fn new(id: ItemId, kind: ItemKind, title: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            status: ItemStatus::default(),
            priority: ItemPriority::default(),
            task_type: None,
        }
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: ItemPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Flat shape of a linked item used by the milestone edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedItemRef {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    pub status: ItemStatus,
    pub priority: ItemPriority,
}

impl From<&Item> for LinkedItemRef {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            kind: item.kind,
            title: item.title.clone(),
            status: item.status,
            priority: item.priority,
        }
    }
}
