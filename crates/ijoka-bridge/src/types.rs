//! Request/response bodies for the HTTP API (spec.md §6). Kept separate
//! from `ijoka-types`/`ijoka-core` since these shapes are wire concerns,
//! not domain entities -- same split as the teacher's
//! `at-bridge::http_api::types`.

use ijoka_types::{Feature, FeatureCategory, WorkItemType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct ListFeaturesQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFeatureRequest {
    pub description: String,
    pub category: FeatureCategory,
    #[serde(rename = "type", default = "default_work_item_type")]
    pub kind: WorkItemType,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub steps: Option<Vec<String>>,
    #[serde(default)]
    pub branch_hint: Option<String>,
    #[serde(default)]
    pub file_patterns: Vec<String>,
}

fn default_work_item_type() -> WorkItemType {
    WorkItemType::Feature
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFeatureRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<FeatureCategory>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub file_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub branch_hint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartFeatureQuery {
    pub agent: String,
    #[serde(default)]
    pub force_override: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteFeatureQuery {
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockFeatureRequest {
    pub reason: String,
    #[serde(default)]
    pub blocking_feature_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverFeatureRequest {
    pub description: String,
    pub category: FeatureCategory,
    #[serde(rename = "type", default = "default_work_item_type")]
    pub kind: WorkItemType,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub steps: Option<Vec<String>>,
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: i64,
    #[serde(default)]
    pub mark_complete: bool,
    #[serde(default)]
    pub branch_hint: Option<String>,
}

fn default_lookback_minutes() -> i64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPlanRequest {
    pub steps: Vec<String>,
    pub feature_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointRequest {
    /// Bit-exact wire shape (spec.md §6) omits a feature id; when absent,
    /// the handler resolves it to the project's current feature (same
    /// definition `GET /status` uses for `current_feature`).
    #[serde(default)]
    pub feature_id: Option<Uuid>,
    pub step_completed: Option<String>,
    pub current_activity: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

impl Progress {
    pub fn from_steps(steps: &[ijoka_types::Step]) -> Self {
        let total = steps.len();
        let completed = steps
            .iter()
            .filter(|s| s.status == ijoka_types::StepStatus::Completed)
            .count();
        let percentage = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64) * 100.0
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInsightRequest {
    pub description: String,
    pub pattern_type: ijoka_types::InsightPatternType,
    #[serde(default)]
    pub tags: Vec<String>,
    pub feature_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightFeedbackRequest {
    pub insight_id: Uuid,
    pub helpful: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VelocityQuery {
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsQueryRequest {
    pub question: String,
}

/// `{total, completed, in_progress, remaining, percentage, by_category}`,
/// the same shape the original hook script's `get_stats` reported.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub remaining: usize,
    pub percentage: f64,
    pub by_category: std::collections::BTreeMap<String, CategoryStats>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CategoryStats {
    pub total: usize,
    pub completed: usize,
}

impl FeatureStats {
    pub fn compute(features: &[Feature]) -> Self {
        let total = features.len();
        let completed = features
            .iter()
            .filter(|f| f.status == ijoka_types::FeatureStatus::Complete)
            .count();
        let in_progress = features
            .iter()
            .filter(|f| f.status == ijoka_types::FeatureStatus::InProgress)
            .count();
        let percentage = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64) * 100.0
        };

        let mut by_category: std::collections::BTreeMap<String, CategoryStats> = Default::default();
        for f in features {
            let entry = by_category.entry(f.category.to_string()).or_default();
            entry.total += 1;
            if f.status == ijoka_types::FeatureStatus::Complete {
                entry.completed += 1;
            }
        }

        Self {
            total,
            completed,
            in_progress,
            remaining: total - completed,
            percentage,
            by_category,
        }
    }
}
