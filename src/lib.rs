pub mod config;
pub mod editor;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod item;
pub mod metadata;
pub mod milestone;
pub mod permissions;
pub mod persistence;
pub mod progress;
pub mod resolver;
pub mod schedule;
pub mod status;
pub mod store;
pub mod visibility;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AppConfig, ConfigError};
pub use editor::{EditorState, MilestoneEditor, ScheduleError, Toast, ToastLevel};
pub use item::{Item, ItemId, ItemKind, ItemPriority, ItemStatus, LinkedItemRef};
pub use metadata::ProjectMetadata;
pub use milestone::{
    EventType, Milestone, MilestoneDraft, MilestoneFields, MilestoneId, MilestoneStatus,
    ProjectId, ValidationError,
};
pub use permissions::{Action, PermissionDenied, PermissionSnapshot};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteScheduleStore;
pub use persistence::{
    InMemoryScheduleStore, ScheduleSnapshot, load_schedule_from_json, save_schedule_to_json,
};
pub use progress::{Rgb, calculate_milestone_progress, overall_milestone_progress, progress_color};
pub use resolver::{ResolvedMilestone, resolve_linked_items};
pub use schedule::{MilestoneProgress, ProjectSchedule, ScheduleSummary};
pub use status::{ScheduleAssessment, ScheduleStatus, calculate_schedule_status};
pub use store::{ScheduleBackend, StoreError, StoreResult};
pub use visibility::{ClearanceGate, ShowAll, VisibilityGate, VisibilityLevel};
