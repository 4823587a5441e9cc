use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// General project information the schedule module reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_name: String,
    pub project_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_start_date: Option<NaiveDate>,
    /// Without a target end date the schedule status stays `unknown`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_end_date: Option<NaiveDate>,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            project_name: "New Project".to_string(),
            project_description: "No description".to_string(),
            project_start_date: None,
            target_end_date: None,
        }
    }
}

impl ProjectMetadata {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Default::default()
        }
    }
}
