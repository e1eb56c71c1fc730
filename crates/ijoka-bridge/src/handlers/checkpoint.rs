//! `POST /checkpoint` (spec.md §4.7, §6).

use crate::api_error::ApiError;
use crate::state::ApiState;
use crate::types::{CheckpointRequest, Progress};
use crate::util::current_feature;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

pub async fn checkpoint(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CheckpointRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let feature_id = match req.feature_id {
        Some(id) => id,
        None => current_feature(&state).await?.id,
    };

    let result = ijoka_core::plan_step::checkpoint(
        &state.gw,
        feature_id,
        req.step_completed.as_deref(),
        req.current_activity.as_deref(),
    )
    .await?;

    let feature = ijoka_core::feature_store::get(&state.gw, feature_id).await?;
    let steps = ijoka_core::plan_step::get_plan(&state.gw, feature_id).await?;
    let progress = Progress::from_steps(&steps);

    Ok(Json(json!({
        "feature": feature,
        "active_step": result.active_step,
        "progress": progress,
        "warnings": result.warnings,
    })))
}
