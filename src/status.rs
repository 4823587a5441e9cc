use crate::milestone::{Milestone, MilestoneId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Tolerance, in percentage points, around the expected progress that still
/// counts as on track.
pub const ON_TRACK_TOLERANCE: f64 = 10.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleStatus {
    Ahead,
    OnTrack,
    Behind,
    #[default]
    Unknown,
}

/// Classification result plus the numbers it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAssessment {
    pub status: ScheduleStatus,
    /// Incomplete milestones whose start date has passed.
    pub overdue: Vec<MilestoneId>,
    pub progress_percentage: f64,
    pub expected_progress: f64,
}

impl ScheduleAssessment {
    fn unknown() -> Self {
        Self {
            status: ScheduleStatus::Unknown,
            overdue: Vec::new(),
            progress_percentage: 0.0,
            expected_progress: 0.0,
        }
    }
}

/// Classifies the project as ahead, on track or behind.
///
/// `milestones` must be sorted ascending by start date: the first and last
/// entries bound the expected-progress window. With a single milestone the
/// window is empty and the expected progress is 0.
pub fn calculate_schedule_status<M: AsRef<Milestone>>(
    milestones: &[M],
    target_end_date: Option<NaiveDate>,
    today: NaiveDate,
) -> ScheduleAssessment {
    let milestones: Vec<&Milestone> = milestones.iter().map(|m| m.as_ref()).collect();
    let (Some(first), Some(last)) = (milestones.first(), milestones.last()) else {
        return ScheduleAssessment::unknown();
    };
    if target_end_date.is_none() {
        return ScheduleAssessment::unknown();
    }

    let overdue: Vec<MilestoneId> = milestones
        .iter()
        .filter(|m| !m.is_completed() && m.start_date < today)
        .map(|m| m.id)
        .collect();

    let completed = milestones.iter().filter(|m| m.is_completed()).count();
    let progress_percentage = completed as f64 / milestones.len() as f64 * 100.0;
    let expected_progress = expected_progress(first.start_date, last.start_date, today);

    let status = if !overdue.is_empty() {
        ScheduleStatus::Behind
    } else if progress_percentage > expected_progress + ON_TRACK_TOLERANCE {
        ScheduleStatus::Ahead
    } else if progress_percentage >= expected_progress - ON_TRACK_TOLERANCE {
        ScheduleStatus::OnTrack
    } else {
        ScheduleStatus::Behind
    };

    ScheduleAssessment {
        status,
        overdue,
        progress_percentage,
        expected_progress,
    }
}

/// Share of the `first..last` window that has elapsed by `today`, 0..=100.
fn expected_progress(first: NaiveDate, last: NaiveDate, today: NaiveDate) -> f64 {
    let span = (last - first).num_days();
    if span <= 0 {
        return 0.0;
    }
    let elapsed = (today - first).num_days();
    (elapsed as f64 / span as f64 * 100.0).clamp(0.0, 100.0)
}
