use crate::metadata::ProjectMetadata;
use crate::milestone::{MilestoneId, ProjectId};
use crate::progress::{Rgb, overall_milestone_progress, progress_color};
use crate::resolver::{ResolvedMilestone, resolve_linked_items};
use crate::status::{ScheduleAssessment, ScheduleStatus, calculate_schedule_status};
use crate::store::{ScheduleBackend, StoreResult};
use crate::visibility::{VisibilityGate, filter_visible};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Per-milestone line of a [`ScheduleSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneProgress {
    pub id: MilestoneId,
    pub title: String,
    pub start_date: NaiveDate,
    pub completed: bool,
    pub linked_count: usize,
    /// Share of linked items done or resolved.
    pub progress: u8,
    pub color: Rgb,
}

impl From<&ResolvedMilestone> for MilestoneProgress {
    fn from(resolved: &ResolvedMilestone) -> Self {
        let progress = resolved.progress();
        Self {
            id: resolved.id,
            title: resolved.title.clone(),
            start_date: resolved.start_date,
            completed: resolved.is_completed(),
            linked_count: resolved.linked_items.len(),
            progress,
            color: progress_color(f64::from(progress)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub project_id: ProjectId,
    pub milestone_count: usize,
    pub completed_count: usize,
    /// Share of milestones flagged completed. Independent of item progress.
    pub overall_progress: u8,
    pub overall_color: Rgb,
    pub assessment: ScheduleAssessment,
    pub milestones: Vec<MilestoneProgress>,
}

impl ScheduleSummary {
    pub fn status(&self) -> ScheduleStatus {
        self.assessment.status
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("milestones={}", self.milestone_count));
        parts.push(format!("completed={}", self.completed_count));
        parts.push(format!("progress={}%", self.overall_progress));
        parts.push(format!("status={}", self.assessment.status));
        if !self.assessment.overdue.is_empty() {
            let ids = self
                .assessment
                .overdue
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("overdue={}", ids));
        }
        parts.join(", ")
    }
}

/// Milestones of one project as the schedule view sees them: filtered by
/// visibility, ordered by start date, with linked items attached.
#[derive(Debug, Clone)]
pub struct ProjectSchedule {
    project_id: ProjectId,
    metadata: ProjectMetadata,
    milestones: Vec<ResolvedMilestone>,
}

impl ProjectSchedule {
    pub fn new(
        project_id: ProjectId,
        metadata: ProjectMetadata,
        milestones: Vec<ResolvedMilestone>,
    ) -> Self {
        Self {
            project_id,
            metadata,
            milestones,
        }
    }

    /// Runs the load pipeline: list, visibility gate, link resolution.
    pub fn load<B, G>(backend: &B, project_id: ProjectId, gate: &G) -> StoreResult<Self>
    where
        B: ScheduleBackend + ?Sized,
        G: VisibilityGate + ?Sized,
    {
        let metadata = backend.load_project(project_id)?.unwrap_or_default();
        let milestones = backend.list_milestones(project_id)?;
        let listed = milestones.len();
        let visible = filter_visible(backend, milestones, gate)?;
        let resolved = resolve_linked_items(backend, visible)?;
        info!(
            project_id,
            listed,
            visible = resolved.len(),
            "loaded project schedule"
        );
        Ok(Self::new(project_id, metadata, resolved))
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn milestones(&self) -> &[ResolvedMilestone] {
        &self.milestones
    }

    pub fn find(&self, milestone_id: MilestoneId) -> Option<&ResolvedMilestone> {
        self.milestones.iter().find(|m| m.id == milestone_id)
    }

    pub fn overall_progress(&self) -> u8 {
        overall_milestone_progress(self.milestones.iter().map(|m| &m.milestone))
    }

    pub fn assessment(&self, today: NaiveDate) -> ScheduleAssessment {
        calculate_schedule_status(&self.milestones, self.metadata.target_end_date, today)
    }

    pub fn summary(&self, today: NaiveDate) -> ScheduleSummary {
        let overall_progress = self.overall_progress();
        ScheduleSummary {
            project_id: self.project_id,
            milestone_count: self.milestones.len(),
            completed_count: self.milestones.iter().filter(|m| m.is_completed()).count(),
            overall_progress,
            overall_color: progress_color(f64::from(overall_progress)),
            assessment: self.assessment(today),
            milestones: self.milestones.iter().map(MilestoneProgress::from).collect(),
        }
    }
}
