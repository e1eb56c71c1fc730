//! Response shapes for the Analytics Read-Views (spec.md §4.11). These are
//! computed fresh on every call -- unlike `ijoka_types::Insight`, nothing
//! here is persisted in the graph.

use chrono::{DateTime, Utc};
use ijoka_types::FeatureCategory;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCluster {
    pub id: Uuid,
    pub name: String,
    pub feature_ids: Vec<Uuid>,
    pub common_category: Option<FeatureCategory>,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPattern {
    pub id: Uuid,
    pub sequence: Vec<String>,
    pub frequency: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl BottleneckSeverity {
    /// Thresholds from spec.md §4.11: >72h=critical, >24h=high, >8h=medium,
    /// else low.
    pub fn from_hours_blocked(hours: f64) -> Self {
        if hours > 72.0 {
            BottleneckSeverity::Critical
        } else if hours > 24.0 {
            BottleneckSeverity::High
        } else if hours > 8.0 {
            BottleneckSeverity::Medium
        } else {
            BottleneckSeverity::Low
        }
    }

    pub fn impact_score(self) -> f64 {
        match self {
            BottleneckSeverity::Critical => 0.95,
            BottleneckSeverity::High => 0.8,
            BottleneckSeverity::Medium => 0.6,
            BottleneckSeverity::Low => 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bottleneck {
    pub feature_id: Uuid,
    pub description: String,
    pub severity: BottleneckSeverity,
    pub hours_blocked: Option<f64>,
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityMetrics {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub features_started: u64,
    pub features_completed: u64,
    pub avg_cycle_time_hours: Option<f64>,
    pub features_per_day: f64,
    pub trend: VelocityTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub agent_id: String,
    pub total_features: u64,
    pub completed_features: u64,
    pub avg_completion_time_hours: Option<f64>,
    pub preferred_categories: Vec<FeatureCategory>,
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestInsightKind {
    Bottleneck,
    Anomaly,
    Pattern,
    Trend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestInsight {
    pub kind: DigestInsightKind,
    pub description: String,
    pub impact_score: f64,
    pub confidence: f64,
    pub related_features: Vec<Uuid>,
    pub actionable: bool,
}

impl DigestInsight {
    pub fn rank(&self) -> f64 {
        self.impact_score * self.confidence
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsView {
    pub clusters: Vec<FeatureCluster>,
    pub workflows: Vec<WorkflowPattern>,
    pub bottlenecks: Vec<Bottleneck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub date: DateTime<Utc>,
    pub top_insights: Vec<DigestInsight>,
    pub velocity: VelocityMetrics,
    pub active_bottlenecks: Vec<Bottleneck>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Velocity,
    Bottlenecks,
    Profile,
    Patterns,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_type: QueryType,
    pub data: serde_json::Value,
    pub insights: Vec<DigestInsight>,
}
