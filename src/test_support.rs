use crate::milestone::{EventType, Milestone, MilestoneId, MilestoneStatus};
use chrono::{NaiveDate, TimeZone, Utc};

pub(crate) fn milestone(id: MilestoneId, title: &str, y: i32, m: u32, d: u32) -> Milestone {
    Milestone {
        id,
        project_id: 1,
        title: title.to_string(),
        start_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        end_date: None,
        description: None,
        color: None,
        event_type: EventType::Milestone,
        status: MilestoneStatus::Scheduled,
        created_by: "tester".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
    }
}
