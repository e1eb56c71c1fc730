use super::enums::FeatureStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit record of a Feature's status transition. The
/// `Feature.status` field is a materialised view of the most recent
/// StatusEvent on that Feature (invariant I3) -- this is the source of
/// truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub id: Uuid,
    pub from_status: FeatureStatus,
    pub to_status: FeatureStatus,
    pub at: DateTime<Utc>,
    /// Actor token, e.g. `"start:<agent>"` or `"auto:first_activity:<event-id>"`.
    pub by: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl StatusEvent {
    pub fn new(
        from_status: FeatureStatus,
        to_status: FeatureStatus,
        by: impl Into<String>,
        session_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_status,
            to_status,
            at: Utc::now(),
            by: by.into(),
            session_id,
            reason: None,
        }
    }
}
