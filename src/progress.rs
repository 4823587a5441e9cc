use crate::item::Item;
use crate::milestone::Milestone;
use crate::resolver::ResolvedMilestone;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentage of linked items that are `done` or `resolved`, rounded.
///
/// A milestone without linked items reports 0.
pub fn calculate_milestone_progress(linked_items: &[Item]) -> u8 {
    if linked_items.is_empty() {
        return 0;
    }
    let completed = linked_items
        .iter()
        .filter(|item| item.status.counts_as_complete())
        .count();
    percent(completed, linked_items.len())
}

impl ResolvedMilestone {
    pub fn progress(&self) -> u8 {
        calculate_milestone_progress(&self.linked_items)
    }
}

/// Percentage of milestones flagged `completed`, rounded.
///
/// Only the milestone's own status flag counts; linked item progress plays no
/// part, so this and [`calculate_milestone_progress`] can disagree.
pub fn overall_milestone_progress<'a, I>(milestones: I) -> u8
where
    I: IntoIterator<Item = &'a Milestone>,
{
    let mut total = 0;
    let mut completed = 0;
    for milestone in milestones {
        total += 1;
        if milestone.is_completed() {
            completed += 1;
        }
    }
    if total == 0 {
        return 0;
    }
    percent(completed, total)
}

fn percent(part: usize, whole: usize) -> u8 {
    (part as f64 / whole as f64 * 100.0).round() as u8
}

/// An RGB triple as computed by [`progress_color`].
///
/// Channels are not clamped to 0..=255: at exactly 50% the green channel is
/// 259.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl Rgb {
    pub const fn new(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Red at 0%, amber around 50%, green at 100%, interpolated in two linear
/// segments.
pub fn progress_color(percentage: f64) -> Rgb {
    if percentage <= 50.0 {
        let g = (68.0 + 191.0 * percentage / 50.0).round() as i32;
        return Rgb::new(239, g, 68);
    }
    let t = (percentage - 50.0) / 50.0;
    Rgb::new(
        (239.0 - 205.0 * t).round() as i32,
        (235.0 - 40.0 * t).round() as i32,
        (68.0 + 21.0 * t).round() as i32,
    )
}
