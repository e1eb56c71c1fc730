//! Daily digest: cross-references bottlenecks, velocity drift, and common
//! workflows into a ranked insight list (spec.md §4.11). Grounded in the
//! original Python `InsightSynthesizer.generate_daily_digest`.

use crate::patterns::{detect_bottlenecks, find_common_workflows};
use crate::types::{Digest, DigestInsight, DigestInsightKind};
use crate::velocity::{compute_velocity, detect_velocity_drift};
use chrono::Utc;
use ijoka_core::CoreError;
use ijoka_graph::GraphGateway;
use uuid::Uuid;

pub async fn generate(
    gw: &GraphGateway,
    project_id: Uuid,
    max_insights: usize,
) -> Result<Digest, CoreError> {
    let mut insights = Vec::new();

    let bottlenecks = detect_bottlenecks(gw, project_id).await?;
    for b in bottlenecks.iter().take(3) {
        let mut description = format!("Feature blocked: {}", b.description);
        if let Some(reason) = &b.block_reason {
            description.push_str(&format!(" Reason: {reason}"));
        }
        insights.push(DigestInsight {
            kind: DigestInsightKind::Bottleneck,
            description,
            impact_score: b.severity.impact_score(),
            confidence: 0.9,
            related_features: vec![b.feature_id],
            actionable: true,
        });
    }

    for warning in detect_velocity_drift(gw, project_id).await? {
        insights.push(DigestInsight {
            kind: DigestInsightKind::Anomaly,
            description: warning,
            impact_score: 0.7,
            confidence: 0.75,
            related_features: Vec::new(),
            actionable: true,
        });
    }

    let patterns = find_common_workflows(gw, project_id, 2).await?;
    if let Some(top) = patterns.first() {
        let mut summary = top.sequence.iter().take(3).cloned().collect::<Vec<_>>().join(" -> ");
        if top.sequence.len() > 3 {
            summary.push_str("...");
        }
        insights.push(DigestInsight {
            kind: DigestInsightKind::Pattern,
            description: format!("Common successful workflow ({}x): {summary}", top.frequency),
            impact_score: 0.5,
            confidence: 0.85,
            related_features: Vec::new(),
            actionable: false,
        });
    }

    let velocity = compute_velocity(gw, project_id, 7).await?;
    if velocity.features_completed > 0 {
        let mut description = format!(
            "Completed {} features in the past week",
            velocity.features_completed
        );
        if let Some(hours) = velocity.avg_cycle_time_hours {
            description.push_str(&format!(" (avg {hours:.1}h cycle time)"));
        }
        insights.push(DigestInsight {
            kind: DigestInsightKind::Trend,
            description,
            impact_score: 0.4,
            confidence: 0.95,
            related_features: Vec::new(),
            actionable: false,
        });
    }

    insights.sort_by(|a, b| b.rank().partial_cmp(&a.rank()).unwrap());
    insights.truncate(max_insights);

    Ok(Digest {
        date: Utc::now(),
        top_insights: insights,
        velocity,
        active_bottlenecks: bottlenecks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::{Feature, FeatureCategory, WorkItemType};

    #[tokio::test]
    async fn digest_surfaces_bottlenecks() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
        let mut f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0);
        f.block_reason = Some("waiting on ci".into());
        ijoka_graph::nodes::features::create(&gw, f, project.id).await.unwrap();

        let digest = generate(&gw, project.id, 10).await.unwrap();
        assert_eq!(digest.active_bottlenecks.len(), 1);
        assert!(digest
            .top_insights
            .iter()
            .any(|i| i.kind == DigestInsightKind::Bottleneck));
    }
}
