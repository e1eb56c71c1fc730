//! `/insights` and `/analytics/feedback` routes (spec.md §3 Insight entity,
//! §4.4, §6). Feature Store responsibility, not an Analytics Read-View --
//! `Insight` is persisted, unlike the ephemeral aggregations in
//! `ijoka-analytics`.

use crate::api_error::ApiError;
use crate::state::ApiState;
use crate::types::{CreateInsightRequest, InsightFeedbackRequest, InsightQuery};
use axum::{extract::State, response::IntoResponse, Json};
use ijoka_types::Insight;
use serde_json::json;
use std::sync::Arc;

pub async fn list_insights(
    State(state): State<Arc<ApiState>>,
    axum::extract::Query(q): axum::extract::Query<InsightQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tags = q
        .tags
        .map(|t| t.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let limit = q.limit.unwrap_or(20);
    let insights = ijoka_core::insights::list(&state.gw, q.query, tags, limit).await?;
    Ok(Json(json!({ "insights": insights, "count": insights.len() })))
}

pub async fn create_insight(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreateInsightRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut insight = Insight::new(req.description, req.pattern_type);
    insight.tags = req.tags.into_iter().collect();
    let insight = ijoka_core::insights::create(&state.gw, insight, req.feature_id).await?;
    Ok(Json(json!({ "insight": insight })))
}

pub async fn record_feedback(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<InsightFeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let insight = ijoka_core::insights::record_feedback(&state.gw, req.insight_id, req.helpful).await?;
    if let Some(comment) = req.comment {
        tracing::info!(insight_id = %req.insight_id, %comment, "insight feedback comment");
    }
    Ok(Json(json!({ "insight": insight })))
}
