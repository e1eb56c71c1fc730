use super::enums::StepStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ordered unit of a Feature's plan. No `feature_id` field: per
/// SPEC_FULL.md §E.1, the owning Feature is derived from the `BELONGS_TO`
/// edge, not stored redundantly on the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub description: String,
    pub status: StepStatus,
    pub step_order: u32,
    #[serde(default)]
    pub expected_tools: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Step {
    pub fn new(description: impl Into<String>, step_order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            status: StepStatus::Pending,
            step_order,
            expected_tools: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn start(&mut self, at: DateTime<Utc>) {
        self.status = StepStatus::InProgress;
        self.started_at = Some(at);
    }

    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = StepStatus::Completed;
        self.completed_at = Some(at);
    }

    pub fn skip(&mut self) {
        self.status = StepStatus::Skipped;
    }
}
