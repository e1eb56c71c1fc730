//! Bare `/plan` routes (spec.md §6) -- operate on the project's current
//! feature; see `crate::util::current_feature`.

use crate::api_error::ApiError;
use crate::state::ApiState;
use crate::types::{Progress, SetPlanRequest};
use crate::util::current_feature;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub async fn get_plan(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse, ApiError> {
    let feature = current_feature(&state).await?;
    plan_response(&state, feature.id).await
}

pub async fn post_plan(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<SetPlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let feature_id = match req.feature_id {
        Some(id) => id,
        None => current_feature(&state).await?.id,
    };
    ijoka_core::plan_step::set_plan(&state.gw, feature_id, req.steps).await?;
    plan_response(&state, feature_id).await
}

pub(crate) async fn plan_response(
    state: &ApiState,
    feature_id: Uuid,
) -> Result<impl IntoResponse, ApiError> {
    let steps = ijoka_core::plan_step::get_plan(&state.gw, feature_id).await?;
    let active_step = ijoka_core::plan_step::active_step(&steps).cloned();
    let progress = Progress::from_steps(&steps);
    Ok(Json(json!({
        "feature_id": feature_id,
        "steps": steps,
        "active_step": active_step,
        "progress": progress,
    })))
}
