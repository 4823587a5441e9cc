use crate::milestone::Milestone;
use crate::store::{ScheduleBackend, StoreResult};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::debug;

/// Audience a milestone is shown to. Levels are ordered from widest to
/// narrowest audience.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VisibilityLevel {
    #[default]
    Public,
    Team,
    Management,
}

/// Pass/fail decision applied to milestones before any progress math.
pub trait VisibilityGate {
    fn allows(&self, milestone: &Milestone, level: VisibilityLevel) -> bool;
}

/// Lets everything through.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowAll;

impl VisibilityGate for ShowAll {
    fn allows(&self, _milestone: &Milestone, _level: VisibilityLevel) -> bool {
        true
    }
}

/// Admits milestones whose level is at or below the viewer's clearance.
#[derive(Debug, Clone, Copy)]
pub struct ClearanceGate {
    pub clearance: VisibilityLevel,
}

impl ClearanceGate {
    pub fn new(clearance: VisibilityLevel) -> Self {
        Self { clearance }
    }
}

impl VisibilityGate for ClearanceGate {
    fn allows(&self, _milestone: &Milestone, level: VisibilityLevel) -> bool {
        level <= self.clearance
    }
}

/// Drops the milestones the gate rejects, keeping the input order.
pub fn filter_visible<B, G>(
    backend: &B,
    milestones: Vec<Milestone>,
    gate: &G,
) -> StoreResult<Vec<Milestone>>
where
    B: ScheduleBackend + ?Sized,
    G: VisibilityGate + ?Sized,
{
    let mut visible = Vec::with_capacity(milestones.len());
    for milestone in milestones {
        let level = backend.visibility(milestone.id)?.unwrap_or_default();
        if gate.allows(&milestone, level) {
            visible.push(milestone);
        } else {
            debug!(milestone_id = milestone.id, %level, "milestone hidden by visibility gate");
        }
    }
    Ok(visible)
}
