pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{ScheduleSnapshot, load_schedule_from_json, save_schedule_to_json};
pub use memory::InMemoryScheduleStore;
