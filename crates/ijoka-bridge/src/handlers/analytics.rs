//! `/analytics/*` routes (spec.md §4.11, §6) -- thin adapters over
//! `ijoka-analytics`'s read-views.

use crate::api_error::ApiError;
use crate::state::ApiState;
use crate::types::{AnalyticsQueryRequest, VelocityQuery};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use ijoka_analytics::{digest, patterns, profile, query, velocity};
use serde_json::json;
use std::sync::Arc;

pub async fn get_patterns(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse, ApiError> {
    let clusters = patterns::detect_feature_clusters(&state.gw, state.project.id).await?;
    let workflows = patterns::find_common_workflows(&state.gw, state.project.id, 2).await?;
    let bottlenecks = patterns::detect_bottlenecks(&state.gw, state.project.id).await?;
    Ok(Json(json!({ "clusters": clusters, "workflows": workflows, "bottlenecks": bottlenecks })))
}

pub async fn get_velocity(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<VelocityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = q.days.unwrap_or(7);
    let current = velocity::compute_velocity(&state.gw, state.project.id, days).await?;
    let drift_warnings = velocity::detect_velocity_drift(&state.gw, state.project.id).await?;
    Ok(Json(json!({ "current": current, "drift_warnings": drift_warnings })))
}

pub async fn get_agent_profile(
    State(state): State<Arc<ApiState>>,
    Path(agent): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = profile::build_profile(&state.gw, state.project.id, &agent).await?;
    Ok(Json(json!({ "profile": profile })))
}

pub async fn post_query(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<AnalyticsQueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = query::route(&state.gw, state.project.id, &req.question).await?;
    Ok(Json(response))
}

pub async fn get_digest(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse, ApiError> {
    let d = digest::generate(&state.gw, state.project.id, 10).await?;
    Ok(Json(d))
}
