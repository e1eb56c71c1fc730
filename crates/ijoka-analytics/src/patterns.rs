//! Feature clusters, common workflows, and bottlenecks (spec.md §4.11).
//! Grounded in the teacher's `at-bridge::intelligence_api`-style pattern of
//! read-only aggregation over in-memory/store state, adapted here to read
//! over the graph instead of a `HashMap`.

use crate::types::{Bottleneck, BottleneckSeverity, FeatureCluster, WorkflowPattern};
use chrono::Utc;
use ijoka_core::CoreError;
use ijoka_graph::GraphGateway;
use ijoka_types::FeatureStatus;
use std::collections::HashMap;
use uuid::Uuid;

/// Group features by category; excludes single-item groups (spec.md §4.11).
pub async fn detect_feature_clusters(
    gw: &GraphGateway,
    project_id: Uuid,
) -> Result<Vec<FeatureCluster>, CoreError> {
    let features = ijoka_graph::nodes::features::list_for_project(gw, project_id, None).await?;

    let mut by_category: HashMap<String, Vec<Uuid>> = HashMap::new();
    for f in &features {
        by_category
            .entry(f.category.to_string())
            .or_default()
            .push(f.id);
    }

    let mut clusters: Vec<FeatureCluster> = by_category
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(category, ids)| {
            let common_category = features
                .iter()
                .find(|f| f.category.to_string() == category)
                .map(|f| f.category);
            FeatureCluster {
                id: Uuid::new_v4(),
                name: format!("{category} features"),
                size: ids.len(),
                feature_ids: ids,
                common_category,
            }
        })
        .collect();
    clusters.sort_by(|a, b| b.size.cmp(&a.size));
    Ok(clusters)
}

/// Recurring ordered Step-description sequences across `complete` features,
/// grouped by identical sequence, returned when frequency >= `min_frequency`.
pub async fn find_common_workflows(
    gw: &GraphGateway,
    project_id: Uuid,
    min_frequency: usize,
) -> Result<Vec<WorkflowPattern>, CoreError> {
    let features =
        ijoka_graph::nodes::features::list_for_project(gw, project_id, Some(FeatureStatus::Complete))
            .await?;

    let mut by_sequence: HashMap<Vec<String>, usize> = HashMap::new();
    for f in &features {
        let mut steps = ijoka_graph::nodes::steps::list_for_feature(gw, f.id).await?;
        if steps.is_empty() {
            continue;
        }
        steps.sort_by_key(|s| s.step_order);
        let sequence: Vec<String> = steps.into_iter().map(|s| s.description).collect();
        *by_sequence.entry(sequence).or_insert(0) += 1;
    }

    let mut patterns: Vec<WorkflowPattern> = by_sequence
        .into_iter()
        .filter(|(_, freq)| *freq >= min_frequency)
        .map(|(sequence, frequency)| WorkflowPattern {
            id: Uuid::new_v4(),
            sequence,
            frequency,
            success_rate: 1.0,
        })
        .collect();
    patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    patterns.truncate(20);
    Ok(patterns)
}

/// Features with `status = blocked` OR a set `block_reason`, severity
/// derived from hours elapsed since `updated_at`.
pub async fn detect_bottlenecks(
    gw: &GraphGateway,
    project_id: Uuid,
) -> Result<Vec<Bottleneck>, CoreError> {
    let features = ijoka_graph::nodes::features::list_for_project(gw, project_id, None).await?;
    let now = Utc::now();

    let mut bottlenecks: Vec<Bottleneck> = features
        .into_iter()
        .filter(|f| f.status == FeatureStatus::Blocked || f.block_reason.is_some())
        .map(|f| {
            let hours_blocked = (now - f.updated_at).num_seconds() as f64 / 3600.0;
            Bottleneck {
                feature_id: f.id,
                description: f.description,
                severity: BottleneckSeverity::from_hours_blocked(hours_blocked),
                hours_blocked: Some(hours_blocked),
                block_reason: f.block_reason,
            }
        })
        .collect();
    bottlenecks.sort_by(|a, b| b.hours_blocked.partial_cmp(&a.hours_blocked).unwrap());
    Ok(bottlenecks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::{Feature, FeatureCategory, WorkItemType};

    #[tokio::test]
    async fn clusters_exclude_singletons() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
        ijoka_graph::nodes::features::create(
            &gw,
            Feature::new_work_item("a", FeatureCategory::Ui, WorkItemType::Feature, 0),
            project.id,
        )
        .await
        .unwrap();
        ijoka_graph::nodes::features::create(
            &gw,
            Feature::new_work_item("b", FeatureCategory::Security, WorkItemType::Feature, 0),
            project.id,
        )
        .await
        .unwrap();

        let clusters = detect_feature_clusters(&gw, project.id).await.unwrap();
        assert!(clusters.is_empty(), "single-member categories must not form a cluster");
    }

    #[tokio::test]
    async fn bottlenecks_catch_blocked_and_reasoned_features() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
        let mut f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0);
        f.block_reason = Some("waiting on review".into());
        ijoka_graph::nodes::features::create(&gw, f, project.id).await.unwrap();

        let bottlenecks = detect_bottlenecks(&gw, project.id).await.unwrap();
        assert_eq!(bottlenecks.len(), 1);
        assert_eq!(bottlenecks[0].severity, BottleneckSeverity::Low);
    }
}
