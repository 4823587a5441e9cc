use chrono::{NaiveDate, TimeZone, Utc};
use site_schedule::{
    EventType, Item, ItemKind, ItemStatus, Milestone, MilestoneStatus, ScheduleStatus,
    calculate_milestone_progress, calculate_schedule_status, overall_milestone_progress,
    progress_color,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn milestone(id: i64, start: NaiveDate, status: MilestoneStatus) -> Milestone {
    Milestone {
        id,
        project_id: 1,
        title: format!("Milestone {id}"),
        start_date: start,
        end_date: None,
        description: None,
        color: None,
        event_type: EventType::Milestone,
        status,
        created_by: "site-manager".into(),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 7, 30, 0).unwrap(),
    }
}

fn task(id: i64, status: ItemStatus) -> Item {
    Item::new(id, ItemKind::Task, format!("Task {id}")).with_status(status)
}

#[test]
fn milestone_without_links_has_zero_progress() {
    assert_eq!(calculate_milestone_progress(&[]), 0);
}

#[test]
fn milestone_progress_counts_done_tasks_and_resolved_defects() {
    let items = vec![
        task(1, ItemStatus::Done),
        Item::new(2, ItemKind::Defect, "Leaking valve").with_status(ItemStatus::Resolved),
        task(3, ItemStatus::InReview),
        Item::new(4, ItemKind::Defect, "Scratched door").with_status(ItemStatus::Closed),
    ];
    assert_eq!(calculate_milestone_progress(&items), 50);
}

#[test]
fn milestone_progress_rounds_and_stays_in_range() {
    let one_of_three = vec![
        task(1, ItemStatus::Done),
        task(2, ItemStatus::Todo),
        task(3, ItemStatus::Blocked),
    ];
    assert_eq!(calculate_milestone_progress(&one_of_three), 33);

    let all_done: Vec<Item> = (1..=7).map(|id| task(id, ItemStatus::Done)).collect();
    assert_eq!(calculate_milestone_progress(&all_done), 100);
}

#[test]
fn overall_progress_counts_completed_milestones() {
    let milestones = vec![
        milestone(1, d(2025, 1, 10), MilestoneStatus::Completed),
        milestone(2, d(2025, 2, 10), MilestoneStatus::Scheduled),
        milestone(3, d(2025, 3, 10), MilestoneStatus::Scheduled),
    ];
    assert_eq!(overall_milestone_progress(&milestones), 33);
    assert_eq!(overall_milestone_progress(&Vec::<Milestone>::new()), 0);
}

#[test]
fn progress_color_endpoints_and_midpoint() {
    let red = progress_color(0.0);
    assert_eq!((red.r, red.g, red.b), (239, 68, 68));

    let mid = progress_color(50.0);
    assert_eq!(mid.g, 259);

    let green = progress_color(100.0);
    assert_eq!((green.r, green.g, green.b), (34, 195, 89));
    assert_eq!(green.to_string(), "rgb(34, 195, 89)");
}

#[test]
fn status_is_unknown_without_milestones_or_target() {
    let today = d(2025, 3, 1);
    let empty: Vec<Milestone> = Vec::new();
    let assessment = calculate_schedule_status(&empty, Some(d(2025, 12, 1)), today);
    assert_eq!(assessment.status, ScheduleStatus::Unknown);

    let milestones = vec![milestone(1, d(2025, 4, 1), MilestoneStatus::Scheduled)];
    let assessment = calculate_schedule_status(&milestones, None, today);
    assert_eq!(assessment.status, ScheduleStatus::Unknown);
}

#[test]
fn overdue_milestone_makes_schedule_behind() {
    let today = d(2025, 3, 1);
    let milestones = vec![
        milestone(1, d(2025, 2, 1), MilestoneStatus::Scheduled),
        milestone(2, d(2025, 4, 1), MilestoneStatus::Completed),
    ];
    let assessment = calculate_schedule_status(&milestones, Some(d(2025, 6, 30)), today);
    assert_eq!(assessment.status, ScheduleStatus::Behind);
    assert_eq!(assessment.overdue, vec![1]);
    assert_eq!(assessment.progress_percentage, 50.0);
}

#[test]
fn single_completed_milestone_is_ahead() {
    let today = d(2025, 3, 1);
    let milestones = vec![milestone(1, d(2025, 2, 1), MilestoneStatus::Completed)];
    let assessment = calculate_schedule_status(&milestones, Some(d(2025, 9, 1)), today);
    assert_eq!(assessment.expected_progress, 0.0);
    assert_eq!(assessment.progress_percentage, 100.0);
    assert_eq!(assessment.status, ScheduleStatus::Ahead);
}

#[test]
fn progress_within_tolerance_is_on_track() {
    // Window Jan 1 .. Jan 11, today Jan 6: expected 50%.
    let today = d(2025, 1, 6);
    let milestones = vec![
        milestone(1, d(2025, 1, 1), MilestoneStatus::Completed),
        milestone(2, d(2025, 1, 11), MilestoneStatus::Scheduled),
    ];
    let assessment = calculate_schedule_status(&milestones, Some(d(2025, 2, 1)), today);
    assert_eq!(assessment.expected_progress, 50.0);
    assert_eq!(assessment.status, ScheduleStatus::OnTrack);
}

#[test]
fn progress_below_tolerance_is_behind_without_overdue() {
    // Window Jan 1 .. Jan 11, today Jan 10: expected 90%, nothing overdue yet.
    let today = d(2025, 1, 10);
    let milestones = vec![
        milestone(1, d(2025, 1, 1), MilestoneStatus::Completed),
        milestone(2, d(2025, 1, 11), MilestoneStatus::Scheduled),
        milestone(3, d(2025, 1, 11), MilestoneStatus::Scheduled),
        milestone(4, d(2025, 1, 11), MilestoneStatus::Scheduled),
    ];
    let assessment = calculate_schedule_status(&milestones, Some(d(2025, 2, 1)), today);
    assert!(assessment.overdue.is_empty());
    assert_eq!(assessment.expected_progress, 90.0);
    assert_eq!(assessment.progress_percentage, 25.0);
    assert_eq!(assessment.status, ScheduleStatus::Behind);
}

#[test]
fn window_uses_slice_order_not_dates() {
    let today = d(2025, 1, 6);
    // Reversed order: last start precedes first start, window is negative.
    let milestones = vec![
        milestone(2, d(2025, 1, 11), MilestoneStatus::Completed),
        milestone(1, d(2025, 1, 1), MilestoneStatus::Completed),
    ];
    let assessment = calculate_schedule_status(&milestones, Some(d(2025, 2, 1)), today);
    assert_eq!(assessment.expected_progress, 0.0);
    assert_eq!(assessment.status, ScheduleStatus::Ahead);
}
