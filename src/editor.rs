//! Selection and edit flow of the schedule screen.
//!
//! The editor owns the loaded [`ProjectSchedule`] and moves between three
//! states: nothing selected, viewing one milestone, and editing a draft.
//! Every action reports its outcome as a [`Toast`] and logs failures; the
//! `Result` is still returned so callers can react.

use crate::item::ItemId;
use crate::milestone::{
    Milestone, MilestoneDraft, MilestoneFields, MilestoneId, ProjectId, ValidationError,
};
use crate::permissions::{Action, PermissionDenied, PermissionSnapshot};
use crate::resolver::ResolvedMilestone;
use crate::schedule::{ProjectSchedule, ScheduleSummary};
use crate::store::{ScheduleBackend, StoreError};
use crate::visibility::{ShowAll, VisibilityGate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no milestone selected")]
    NothingSelected,
    #[error("no milestone is being edited")]
    NotEditing,
    #[error("milestone {0} is not part of this schedule")]
    UnknownMilestone(MilestoneId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    NoneSelected,
    Viewing {
        milestone_id: MilestoneId,
    },
    /// `milestone_id` is `None` while a new milestone is being drafted.
    Editing {
        milestone_id: Option<MilestoneId>,
        draft: MilestoneDraft,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

/// Transient notification shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

pub struct MilestoneEditor<'a, B: ScheduleBackend + ?Sized> {
    backend: &'a B,
    user: String,
    permissions: PermissionSnapshot,
    gate: Box<dyn VisibilityGate + 'a>,
    schedule: ProjectSchedule,
    state: EditorState,
    toasts: Vec<Toast>,
}

impl<'a, B: ScheduleBackend + ?Sized> MilestoneEditor<'a, B> {
    pub fn open(
        backend: &'a B,
        project_id: ProjectId,
        user: impl Into<String>,
        permissions: PermissionSnapshot,
    ) -> Result<Self, ScheduleError> {
        Self::open_with_gate(backend, project_id, user, permissions, ShowAll)
    }

    pub fn open_with_gate<G: VisibilityGate + 'a>(
        backend: &'a B,
        project_id: ProjectId,
        user: impl Into<String>,
        permissions: PermissionSnapshot,
        gate: G,
    ) -> Result<Self, ScheduleError> {
        let schedule = ProjectSchedule::load(backend, project_id, &gate).inspect_err(|err| {
            error!(project_id, "failed to load schedule: {err}");
        })?;
        Ok(Self {
            backend,
            user: user.into(),
            permissions,
            gate: Box::new(gate),
            schedule,
            state: EditorState::NoneSelected,
            toasts: Vec::new(),
        })
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn schedule(&self) -> &ProjectSchedule {
        &self.schedule
    }

    pub fn summary(&self, today: NaiveDate) -> ScheduleSummary {
        self.schedule.summary(today)
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    /// The milestone being viewed or edited, if it still exists.
    pub fn selected(&self) -> Option<&ResolvedMilestone> {
        let id = match &self.state {
            EditorState::Viewing { milestone_id } => *milestone_id,
            EditorState::Editing {
                milestone_id: Some(id),
                ..
            } => *id,
            _ => return None,
        };
        self.schedule.find(id)
    }

    pub fn draft(&self) -> Option<&MilestoneDraft> {
        match &self.state {
            EditorState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn draft_mut(&mut self) -> Result<&mut MilestoneDraft, ScheduleError> {
        match &mut self.state {
            EditorState::Editing { draft, .. } => Ok(draft),
            _ => Err(ScheduleError::NotEditing),
        }
    }

    /// Reloads the schedule from the backend. On failure the previous data
    /// stays in place.
    pub fn reload(&mut self) -> Result<(), ScheduleError> {
        let result = ProjectSchedule::load(self.backend, self.schedule.project_id(), &*self.gate)
            .map_err(ScheduleError::from);
        let schedule = self.report(result, None)?;
        self.schedule = schedule;
        Ok(())
    }

    pub fn select(&mut self, milestone_id: MilestoneId) -> Result<(), ScheduleError> {
        if self.schedule.find(milestone_id).is_none() {
            return self.report(Err(ScheduleError::UnknownMilestone(milestone_id)), None);
        }
        self.state = EditorState::Viewing { milestone_id };
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = EditorState::NoneSelected;
    }

    pub fn begin_create(&mut self) -> Result<(), ScheduleError> {
        let allowed = self.permissions.check(Action::Create).map_err(ScheduleError::from);
        self.report(allowed, None)?;
        self.state = EditorState::Editing {
            milestone_id: None,
            draft: MilestoneDraft::default(),
        };
        Ok(())
    }

    /// Opens the selected milestone in the form, linked items included.
    pub fn begin_edit(&mut self) -> Result<(), ScheduleError> {
        let allowed = self.permissions.check(Action::Edit).map_err(ScheduleError::from);
        self.report(allowed, None)?;
        let Some(selected) = self.selected() else {
            return self.report(Err(ScheduleError::NothingSelected), None);
        };
        let draft = MilestoneDraft::from_milestone(&selected.milestone, selected.linked_item_refs());
        let milestone_id = selected.id;
        self.state = EditorState::Editing {
            milestone_id: Some(milestone_id),
            draft,
        };
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.state = match &self.state {
            EditorState::Editing {
                milestone_id: Some(id),
                ..
            } => EditorState::Viewing { milestone_id: *id },
            EditorState::Editing { .. } => EditorState::NoneSelected,
            other => other.clone(),
        };
    }

    /// Persists the draft, then replaces the milestone's link set wholesale.
    pub fn save(&mut self) -> Result<Milestone, ScheduleError> {
        let EditorState::Editing {
            milestone_id,
            draft,
        } = &self.state
        else {
            return self.report(Err(ScheduleError::NotEditing), None);
        };
        let milestone_id = *milestone_id;
        let action = if milestone_id.is_some() {
            Action::Edit
        } else {
            Action::Create
        };
        let result = self
            .permissions
            .check(action)
            .map_err(ScheduleError::from)
            .and_then(|_| draft.validate().map_err(ScheduleError::from))
            .and_then(|fields| {
                let item_ids = draft.linked_item_ids();
                self.persist(milestone_id, &fields, &item_ids)
            });
        let saved = self.report(result, Some("Milestone saved"))?;
        info!(milestone_id = saved.id, "milestone saved");
        self.reload()?;
        self.state = EditorState::Viewing {
            milestone_id: saved.id,
        };
        Ok(saved)
    }

    fn persist(
        &self,
        milestone_id: Option<MilestoneId>,
        fields: &MilestoneFields,
        item_ids: &[ItemId],
    ) -> Result<Milestone, ScheduleError> {
        let milestone = match milestone_id {
            Some(id) => self.backend.update_milestone(id, fields)?,
            None => self.backend.create_milestone(
                self.schedule.project_id(),
                fields,
                &self.user,
            )?,
        };
        self.backend.replace_milestone_links(milestone.id, item_ids)?;
        Ok(milestone)
    }

    /// Deletes the selected milestone once `confirm` agrees. Returns whether
    /// anything was deleted.
    pub fn delete<F>(&mut self, confirm: F) -> Result<bool, ScheduleError>
    where
        F: FnOnce(&Milestone) -> bool,
    {
        let allowed = self.permissions.check(Action::Delete).map_err(ScheduleError::from);
        self.report(allowed, None)?;
        let Some(selected) = self.selected() else {
            return self.report(Err(ScheduleError::NothingSelected), None);
        };
        if !confirm(&selected.milestone) {
            return Ok(false);
        }
        let milestone_id = selected.id;
        let result = self
            .backend
            .delete_milestone(milestone_id)
            .map_err(ScheduleError::from);
        self.report(result, Some("Milestone deleted"))?;
        info!(milestone_id, "milestone deleted");
        self.state = EditorState::NoneSelected;
        self.reload()?;
        Ok(true)
    }

    /// Flips a milestone between scheduled and completed. Independent of the
    /// edit form.
    pub fn toggle_completion(&mut self, milestone_id: MilestoneId) -> Result<Milestone, ScheduleError> {
        let allowed = self.permissions.check(Action::Edit).map_err(ScheduleError::from);
        self.report(allowed, None)?;
        let Some(current) = self.schedule.find(milestone_id) else {
            return self.report(Err(ScheduleError::UnknownMilestone(milestone_id)), None);
        };
        let next = current.status.toggled();
        let result = self
            .backend
            .set_milestone_status(milestone_id, next)
            .map_err(ScheduleError::from);
        let message = if next.is_completed() {
            "Milestone marked as completed"
        } else {
            "Milestone marked as scheduled"
        };
        let updated = self.report(result, Some(message))?;
        self.reload()?;
        Ok(updated)
    }

    fn report<T>(
        &mut self,
        result: Result<T, ScheduleError>,
        success: Option<&str>,
    ) -> Result<T, ScheduleError> {
        match &result {
            Ok(_) => {
                if let Some(message) = success {
                    self.toasts.push(Toast::success(message));
                }
            }
            Err(err @ (ScheduleError::PermissionDenied(_) | ScheduleError::Validation(_))) => {
                warn!("milestone action rejected: {err}");
                self.toasts.push(Toast::error(err.to_string()));
            }
            Err(err) => {
                error!("milestone action failed: {err}");
                self.toasts.push(Toast::error(err.to_string()));
            }
        }
        result
    }
}
