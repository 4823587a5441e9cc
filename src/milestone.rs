use crate::item::LinkedItemRef;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

pub type ProjectId = i64;
pub type MilestoneId = i64;

/// Kind of marker a timeline event places on the project schedule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventType {
    #[default]
    Milestone,
    Deadline,
    Phase,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MilestoneStatus {
    #[default]
    Scheduled,
    Completed,
}

impl MilestoneStatus {
    pub fn is_completed(self) -> bool {
        self == MilestoneStatus::Completed
    }

    /// The status a completion toggle moves to.
    pub fn toggled(self) -> Self {
        match self {
            MilestoneStatus::Scheduled => MilestoneStatus::Completed,
            MilestoneStatus::Completed => MilestoneStatus::Scheduled,
        }
    }
}

/// A dated timeline event (milestone, deadline or phase) owned by a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub project_id: ProjectId,
    pub title: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display color chosen in the form, stored verbatim (e.g. `#3b82f6`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub status: MilestoneStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Milestone {
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    pub fn fields(&self) -> MilestoneFields {
        MilestoneFields {
            title: self.title.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            description: self.description.clone(),
            color: self.color.clone(),
            event_type: self.event_type,
        }
    }

    pub(crate) fn apply_fields(&mut self, fields: &MilestoneFields) {
        self.title = fields.title.clone();
        self.start_date = fields.start_date;
        self.end_date = fields.end_date;
        self.description = fields.description.clone();
        self.color = fields.color.clone();
        self.event_type = fields.event_type;
    }
}

impl AsRef<Milestone> for Milestone {
    fn as_ref(&self) -> &Milestone {
        self
    }
}

/// The user-editable columns of a milestone, already validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneFields {
    pub title: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub event_type: EventType,
}

impl MilestoneFields {
    pub fn new(title: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            start_date,
            end_date: None,
            description: None,
            color: None,
            event_type: EventType::Milestone,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_parts(&self.title, Some(self.start_date), self.end_date).map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("milestone title is required")]
    MissingTitle,
    #[error("milestone start date is required")]
    MissingStartDate,
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

fn validate_parts(
    title: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<NaiveDate, ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    let start = start_date.ok_or(ValidationError::MissingStartDate)?;
    if let Some(end) = end_date {
        if end < start {
            return Err(ValidationError::EndBeforeStart { start, end });
        }
    }
    Ok(start)
}

/// Form state while a milestone is being created or edited.
///
/// Unlike [`MilestoneFields`], every field may still be missing or
/// inconsistent; [`MilestoneDraft::validate`] turns it into persisted fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestoneDraft {
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub event_type: EventType,
    #[serde(default)]
    pub linked_items: Vec<LinkedItemRef>,
}

impl MilestoneDraft {
    pub fn from_milestone(milestone: &Milestone, linked_items: Vec<LinkedItemRef>) -> Self {
        Self {
            title: milestone.title.clone(),
            start_date: Some(milestone.start_date),
            end_date: milestone.end_date,
            description: milestone.description.clone(),
            color: milestone.color.clone(),
            event_type: milestone.event_type,
            linked_items,
        }
    }

    pub fn validate(&self) -> Result<MilestoneFields, ValidationError> {
        let start_date = validate_parts(&self.title, self.start_date, self.end_date)?;
        Ok(MilestoneFields {
            title: self.title.trim().to_string(),
            start_date,
            end_date: self.end_date,
            description: non_blank(self.description.as_deref()),
            color: non_blank(self.color.as_deref()),
            event_type: self.event_type,
        })
    }

    /// Ids of the linked items in form order, without repeats.
    pub fn linked_item_ids(&self) -> Vec<crate::item::ItemId> {
        let mut ids = Vec::with_capacity(self.linked_items.len());
        for item in &self.linked_items {
            if !ids.contains(&item.id) {
                ids.push(item.id);
            }
        }
        ids
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
