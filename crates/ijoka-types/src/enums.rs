use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a Feature. Materialised from the most recent
/// `StatusEvent` on the Feature (invariant I3); never written directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Pending,
    InProgress,
    Blocked,
    Complete,
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureStatus::Pending => "pending",
            FeatureStatus::InProgress => "in_progress",
            FeatureStatus::Blocked => "blocked",
            FeatureStatus::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Category of a Feature, used by clustering and scored matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Functional,
    Ui,
    Security,
    Performance,
    Documentation,
    Testing,
    Infrastructure,
    Refactoring,
    Planning,
    Meta,
    Enhancement,
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureCategory::Functional => "functional",
            FeatureCategory::Ui => "ui",
            FeatureCategory::Security => "security",
            FeatureCategory::Performance => "performance",
            FeatureCategory::Documentation => "documentation",
            FeatureCategory::Testing => "testing",
            FeatureCategory::Infrastructure => "infrastructure",
            FeatureCategory::Refactoring => "refactoring",
            FeatureCategory::Planning => "planning",
            FeatureCategory::Meta => "meta",
            FeatureCategory::Enhancement => "enhancement",
        };
        write!(f, "{s}")
    }
}

/// What kind of work item a Feature represents. Not only user-facing
/// "features" -- also bugs, spikes, chores, hotfixes, and epics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemType {
    Feature,
    Bug,
    Spike,
    Chore,
    Hotfix,
    Epic,
}

impl WorkItemType {
    /// Type-priority weight used by the Attribution Engine's scored
    /// matching (spec.md §4.6(d)).
    pub fn attribution_weight(self) -> f64 {
        match self {
            WorkItemType::Hotfix => 1.0,
            WorkItemType::Bug => 0.8,
            WorkItemType::Feature => 0.6,
            WorkItemType::Spike => 0.4,
            WorkItemType::Chore => 0.3,
            WorkItemType::Epic => 0.2,
        }
    }
}

/// Lifecycle status of a Step within a Feature's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle status of a Session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended,
    Stale,
}

/// The kind of hook event delivered by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventType {
    ToolCall,
    UserQuery,
    AgentStop,
    SubagentStop,
    PlanUpdate,
    FeatureCompleted,
    SessionStart,
    SessionEnd,
}

/// Classification of a recorded Insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPatternType {
    Solution,
    AntiPattern,
    BestPractice,
    ToolUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_status_display_matches_wire_form() {
        assert_eq!(FeatureStatus::InProgress.to_string(), "in_progress");
        assert_eq!(FeatureStatus::Complete.to_string(), "complete");
    }

    #[test]
    fn work_item_type_weights_are_ordered_hotfix_highest() {
        assert!(WorkItemType::Hotfix.attribution_weight() > WorkItemType::Bug.attribution_weight());
        assert!(WorkItemType::Bug.attribution_weight() > WorkItemType::Feature.attribution_weight());
        assert!(WorkItemType::Feature.attribution_weight() > WorkItemType::Spike.attribution_weight());
        assert!(WorkItemType::Spike.attribution_weight() > WorkItemType::Chore.attribution_weight());
        assert!(WorkItemType::Chore.attribution_weight() > WorkItemType::Epic.attribution_weight());
    }

    #[test]
    fn enums_round_trip_through_json() {
        let s = serde_json::to_string(&FeatureStatus::InProgress).unwrap();
        assert_eq!(s, "\"in_progress\"");
        let back: FeatureStatus = serde_json::from_str(&s).unwrap();
        assert_eq!(back, FeatureStatus::InProgress);
    }
}
