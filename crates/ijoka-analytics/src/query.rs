//! Natural-language query router (spec.md §4.11): keyword-classifies a
//! question into one of {velocity, bottlenecks, profile, patterns, general}
//! and dispatches to the matching view. A router, not an NLU system --
//! grounded in the original Python `AgenticQueryEngine`, reworked from regex
//! patterns onto `ijoka_core::text::contains_any`, matching the rest of this
//! codebase's no-embeddings, no-regex keyword matching.

use crate::types::{DigestInsight, DigestInsightKind, QueryResponse, QueryType};
use crate::{digest, patterns, profile, velocity};
use ijoka_core::text::contains_any;
use ijoka_core::CoreError;
use ijoka_graph::GraphGateway;
use uuid::Uuid;

const VELOCITY_WORDS: &[&str] = &[
    "velocity", "speed", "productivity", "fast", "slow", "throughput", "rate", "per day", "per week",
];
const BOTTLENECK_WORDS: &[&str] = &["block", "stuck", "bottleneck", "problem", "issue", "delay", "blocking"];
const PROFILE_WORDS: &[&str] = &["profile", "agent", "who", "performance", "team", "developer"];
const PATTERN_WORDS: &[&str] = &["pattern", "workflow", "sequence", "common", "typical", "cluster", "group", "category"];
const KNOWN_AGENTS: &[&str] = &["claude-code", "claude", "codex", "gemini", "cursor"];

fn classify(question: &str) -> QueryType {
    if contains_any(question, VELOCITY_WORDS) {
        QueryType::Velocity
    } else if contains_any(question, BOTTLENECK_WORDS) {
        QueryType::Bottlenecks
    } else if contains_any(question, PROFILE_WORDS) {
        QueryType::Profile
    } else if contains_any(question, PATTERN_WORDS) {
        QueryType::Patterns
    } else {
        QueryType::General
    }
}

fn window_days_from_phrasing(question: &str) -> i64 {
    let q = question.to_lowercase();
    if q.contains("month") {
        30
    } else if q.contains("two weeks") || q.contains("2 weeks") {
        14
    } else if q.contains("today") {
        1
    } else {
        7
    }
}

fn extract_agent(question: &str) -> Option<String> {
    let q = question.to_lowercase();
    for agent in KNOWN_AGENTS {
        if q.contains(agent) {
            return Some(agent.to_string());
        }
    }
    if q.contains(" my ") || q.starts_with("my ") {
        return Some("claude-code".to_string());
    }
    None
}

pub async fn route(
    gw: &GraphGateway,
    project_id: Uuid,
    question: &str,
) -> Result<QueryResponse, CoreError> {
    let query_type = classify(question);

    match query_type {
        QueryType::Velocity => {
            let window_days = window_days_from_phrasing(question);
            let metrics = velocity::compute_velocity(gw, project_id, window_days).await?;
            let drift_warnings = velocity::detect_velocity_drift(gw, project_id).await?;
            let insights = drift_warnings
                .iter()
                .map(|w| DigestInsight {
                    kind: DigestInsightKind::Anomaly,
                    description: w.clone(),
                    impact_score: 0.7,
                    confidence: 0.8,
                    related_features: Vec::new(),
                    actionable: true,
                })
                .collect();
            Ok(QueryResponse {
                query_type,
                data: serde_json::json!({ "metrics": metrics, "window_days": window_days, "drift_warnings": drift_warnings }),
                insights,
            })
        }
        QueryType::Bottlenecks => {
            let bottlenecks = patterns::detect_bottlenecks(gw, project_id).await?;
            let insights = bottlenecks
                .iter()
                .take(5)
                .map(|b| DigestInsight {
                    kind: DigestInsightKind::Bottleneck,
                    description: match &b.block_reason {
                        Some(r) => format!("{}: {r}", b.description),
                        None => b.description.clone(),
                    },
                    impact_score: b.severity.impact_score(),
                    confidence: 0.9,
                    related_features: vec![b.feature_id],
                    actionable: true,
                })
                .collect();
            Ok(QueryResponse {
                query_type,
                data: serde_json::json!({ "count": bottlenecks.len(), "bottlenecks": bottlenecks }),
                insights,
            })
        }
        QueryType::Profile => {
            if let Some(agent_id) = extract_agent(question) {
                let p = profile::build_profile(gw, project_id, &agent_id).await?;
                Ok(QueryResponse {
                    query_type,
                    data: serde_json::json!({ "profile": p }),
                    insights: Vec::new(),
                })
            } else {
                let agents = profile::list_agents(gw, project_id).await?;
                let mut profiles = Vec::new();
                for a in agents.iter().take(5) {
                    profiles.push(profile::build_profile(gw, project_id, a).await?);
                }
                Ok(QueryResponse {
                    query_type,
                    data: serde_json::json!({ "agents": agents, "profiles": profiles }),
                    insights: Vec::new(),
                })
            }
        }
        QueryType::Patterns => {
            let clusters = patterns::detect_feature_clusters(gw, project_id).await?;
            let workflows = patterns::find_common_workflows(gw, project_id, 1).await?;
            Ok(QueryResponse {
                query_type,
                data: serde_json::json!({ "clusters": clusters, "workflows": workflows.into_iter().take(10).collect::<Vec<_>>() }),
                insights: Vec::new(),
            })
        }
        QueryType::General => {
            let d = digest::generate(gw, project_id, 10).await?;
            Ok(QueryResponse {
                query_type,
                data: serde_json::to_value(&d).map_err(|e| CoreError::Internal(e.to_string()))?,
                insights: d.top_insights,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_velocity_and_bottleneck_questions() {
        assert_eq!(classify("What is my velocity this week?"), QueryType::Velocity);
        assert_eq!(classify("What's blocking progress?"), QueryType::Bottlenecks);
        assert_eq!(classify("Show me agent performance"), QueryType::Profile);
        assert_eq!(classify("What are the common workflow patterns?"), QueryType::Patterns);
        assert_eq!(classify("Hello there"), QueryType::General);
    }

    #[test]
    fn extracts_known_agent_names() {
        assert_eq!(extract_agent("how is codex doing"), Some("codex".to_string()));
        assert_eq!(extract_agent("what are my stats"), Some("claude-code".to_string()));
        assert_eq!(extract_agent("general question"), None);
    }

    #[test]
    fn window_days_follow_phrasing() {
        assert_eq!(window_days_from_phrasing("velocity this month"), 30);
        assert_eq!(window_days_from_phrasing("velocity today"), 1);
        assert_eq!(window_days_from_phrasing("velocity"), 7);
    }
}
