//! `GET /status` (spec.md §6).

use crate::api_error::ApiError;
use crate::state::ApiState;
use crate::types::FeatureStats;
use axum::{extract::State, response::IntoResponse, Json};
use ijoka_types::FeatureStatus;
use serde_json::json;
use std::sync::Arc;

pub async fn get_status(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse, ApiError> {
    let features = ijoka_core::feature_store::list(&state.gw, state.project.id, None).await?;
    let stats = FeatureStats::compute(&features);
    let current_feature = features
        .iter()
        .filter(|f| !f.is_session_work && f.status == FeatureStatus::InProgress)
        .max_by_key(|f| f.claimed_at)
        .cloned();

    Ok(Json(json!({
        "project": state.project,
        "stats": stats,
        "current_feature": current_feature,
    })))
}
