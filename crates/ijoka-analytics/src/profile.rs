//! Agent behavioral profiles (spec.md §4.11).

use crate::types::AgentProfile;
use ijoka_core::CoreError;
use ijoka_graph::GraphGateway;
use ijoka_types::{Feature, FeatureCategory, FeatureStatus};
use std::collections::HashMap;
use uuid::Uuid;

fn owning_agent(f: &Feature) -> Option<&str> {
    f.assigned_agent.as_deref().or(f.claiming_agent.as_deref())
}

pub async fn build_profile(
    gw: &GraphGateway,
    project_id: Uuid,
    agent_id: &str,
) -> Result<AgentProfile, CoreError> {
    let features: Vec<Feature> = ijoka_graph::nodes::features::list_for_project(gw, project_id, None)
        .await?
        .into_iter()
        .filter(|f| owning_agent(f) == Some(agent_id))
        .collect();

    if features.is_empty() {
        return Ok(AgentProfile {
            agent_id: agent_id.to_string(),
            total_features: 0,
            completed_features: 0,
            avg_completion_time_hours: None,
            preferred_categories: Vec::new(),
            success_rate: None,
        });
    }

    let total = features.len() as u64;
    let mut completed = 0u64;
    let mut category_counts: HashMap<FeatureCategory, u64> = HashMap::new();
    let mut completion_hours = Vec::new();

    for f in &features {
        if f.status == FeatureStatus::Complete {
            completed += 1;
        }
        *category_counts.entry(f.category).or_insert(0) += 1;
        if let Some(completed_at) = f.completed_at {
            completion_hours.push((completed_at - f.created_at).num_seconds() as f64 / 3600.0);
        }
    }

    let mut categories: Vec<(FeatureCategory, u64)> = category_counts.into_iter().collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1));
    let preferred_categories = categories.into_iter().take(5).map(|(c, _)| c).collect();

    let avg_completion_time_hours = if completion_hours.is_empty() {
        None
    } else {
        Some(completion_hours.iter().sum::<f64>() / completion_hours.len() as f64)
    };

    Ok(AgentProfile {
        agent_id: agent_id.to_string(),
        total_features: total,
        completed_features: completed,
        avg_completion_time_hours,
        preferred_categories,
        success_rate: Some(completed as f64 / total as f64),
    })
}

/// Distinct agents that have been `assigned_agent` or `claiming_agent` on
/// any Feature in the project, sorted.
pub async fn list_agents(gw: &GraphGateway, project_id: Uuid) -> Result<Vec<String>, CoreError> {
    let features = ijoka_graph::nodes::features::list_for_project(gw, project_id, None).await?;
    let mut agents: Vec<String> = features
        .iter()
        .filter_map(owning_agent)
        .map(String::from)
        .collect();
    agents.sort();
    agents.dedup();
    Ok(agents)
}
