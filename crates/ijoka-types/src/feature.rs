use super::enums::{FeatureCategory, FeatureStatus, WorkItemType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of user-visible work: not only "features" in the narrow sense --
/// also bugs, spikes, chores, hotfixes, and epics (`WorkItemType`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub description: String,
    pub category: FeatureCategory,
    #[serde(rename = "type")]
    pub kind: WorkItemType,
    pub status: FeatureStatus,
    /// Priority in [-100, 100]; higher is more urgent.
    pub priority: i32,
    pub steps: Vec<String>,
    pub file_patterns: Vec<String>,
    #[serde(default)]
    pub branch_hint: Option<String>,
    #[serde(default)]
    pub work_count: u64,
    #[serde(default)]
    pub assigned_agent: Option<String>,
    #[serde(default)]
    pub claiming_session_id: Option<Uuid>,
    #[serde(default)]
    pub claiming_agent: Option<String>,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_session_work: bool,
    #[serde(default)]
    pub completion_criteria: Option<CompletionCriteria>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Open Question resolution (SPEC_FULL.md §E.2): absence of this field *is*
/// "manual" -- no variant named `Manual` exists, since "manual" means
/// auto-completion never runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionCriteria {
    /// Bash command contains a build keyword, OR matches `command_pattern`
    /// (a regex, e.g. `"cargo (build|check)"`) when one is set.
    Build {
        #[serde(default)]
        command_pattern: Option<String>,
    },
    Test,
    Lint,
    AnySuccess,
    WorkCount { threshold: u64 },
}

impl Feature {
    pub fn new_work_item(
        description: impl Into<String>,
        category: FeatureCategory,
        kind: WorkItemType,
        priority: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            category,
            kind,
            status: FeatureStatus::Pending,
            priority,
            steps: Vec::new(),
            file_patterns: Vec::new(),
            branch_hint: None,
            work_count: 0,
            assigned_agent: None,
            claiming_session_id: None,
            claiming_agent: None,
            claimed_at: None,
            block_reason: None,
            parent_id: None,
            is_primary: false,
            is_session_work: false,
            completion_criteria: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// The Session-Work sentinel Feature for a Project (spec.md glossary).
    pub fn new_session_work(project_name: &str) -> Self {
        let mut f = Self::new_work_item(
            format!("Session work ({project_name})"),
            FeatureCategory::Meta,
            WorkItemType::Chore,
            0,
        );
        f.is_session_work = true;
        f
    }

    /// Invariant I6: claim triple is all-or-nothing.
    pub fn claim_triple_consistent(&self) -> bool {
        let all_set = self.claiming_session_id.is_some()
            && self.claiming_agent.is_some()
            && self.claimed_at.is_some();
        let all_unset = self.claiming_session_id.is_none()
            && self.claiming_agent.is_none()
            && self.claimed_at.is_none();
        all_set || all_unset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_work_item_starts_pending_and_unclaimed() {
        let f = Feature::new_work_item(
            "add login page",
            FeatureCategory::Ui,
            WorkItemType::Feature,
            10,
        );
        assert_eq!(f.status, FeatureStatus::Pending);
        assert!(f.claim_triple_consistent());
        assert!(!f.is_session_work);
    }

    #[test]
    fn session_work_feature_is_flagged() {
        let f = Feature::new_session_work("my-repo");
        assert!(f.is_session_work);
    }

    #[test]
    fn claim_triple_detects_partial_state() {
        let mut f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Bug, 0);
        assert!(f.claim_triple_consistent());
        f.claiming_session_id = Some(Uuid::new_v4());
        assert!(!f.claim_triple_consistent());
        f.claiming_agent = Some("claude".into());
        f.claimed_at = Some(Utc::now());
        assert!(f.claim_triple_consistent());
    }
}
