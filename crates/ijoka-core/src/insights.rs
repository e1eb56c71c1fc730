//! Insight CRUD and feedback (spec.md §3 Insight entity, §4.4 Feature Store).
//! Thin wrapper over `ijoka-graph`'s node operations, same shape as
//! `feature_store.rs`.

use crate::error::CoreError;
use ijoka_graph::GraphGateway;
use ijoka_types::Insight;
use uuid::Uuid;

pub async fn create(
    gw: &GraphGateway,
    insight: Insight,
    feature_id: Option<Uuid>,
) -> Result<Insight, CoreError> {
    Ok(ijoka_graph::nodes::insights::create(gw, insight, feature_id).await?)
}

pub async fn get(gw: &GraphGateway, id: Uuid) -> Result<Insight, CoreError> {
    ijoka_graph::nodes::insights::get(gw, id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("insight {id}")))
}

pub async fn list(
    gw: &GraphGateway,
    query: Option<String>,
    tags: Vec<String>,
    limit: usize,
) -> Result<Vec<Insight>, CoreError> {
    Ok(ijoka_graph::nodes::insights::list(gw, query, tags, limit).await?)
}

/// `POST /analytics/feedback`: records helpful/unhelpful feedback and
/// recomputes the insight's effectiveness score.
pub async fn record_feedback(
    gw: &GraphGateway,
    insight_id: Uuid,
    helpful: bool,
) -> Result<Insight, CoreError> {
    let mut insight = get(gw, insight_id).await?;
    insight.record_feedback(helpful);
    ijoka_graph::nodes::insights::save(gw, insight.clone()).await?;
    Ok(insight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::InsightPatternType;

    #[tokio::test]
    async fn feedback_round_trips_through_the_store() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let insight = create(
            &gw,
            Insight::new("prefer early returns", InsightPatternType::BestPractice),
            None,
        )
        .await
        .unwrap();

        let updated = record_feedback(&gw, insight.id, true).await.unwrap();
        assert_eq!(updated.feedback_count, 1);
        assert_eq!(updated.helpful_count, 1);

        let fetched = get(&gw, insight.id).await.unwrap();
        assert_eq!(fetched.effectiveness_score, Some(1.0));
    }

    #[tokio::test]
    async fn get_missing_insight_is_not_found() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let err = get(&gw, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
