//! `/features*` routes (spec.md §4.4, §4.5, §4.10, §6).

use crate::api_error::ApiError;
use crate::state::ApiState;
use crate::types::{
    BlockFeatureRequest, CompleteFeatureQuery, CreateFeatureRequest, DiscoverFeatureRequest, FeatureStats,
    ListFeaturesQuery, SetPlanRequest, StartFeatureQuery, UpdateFeatureRequest,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use ijoka_types::{Feature, FeatureCategory, FeatureStatus};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn parse_status(s: &str) -> Result<FeatureStatus, ApiError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| ApiError::BadRequest(format!("unknown status: {s}")))
}

fn parse_category(s: &str) -> Result<FeatureCategory, ApiError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| ApiError::BadRequest(format!("unknown category: {s}")))
}

pub async fn list_features(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<ListFeaturesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = q.status.as_deref().map(parse_status).transpose()?;
    let mut features = ijoka_core::feature_store::list(&state.gw, state.project.id, status).await?;
    if let Some(cat) = q.category.as_deref().map(parse_category).transpose()? {
        features.retain(|f| f.category == cat);
    }
    let stats = FeatureStats::compute(&features);
    let count = features.len();
    Ok(Json(json!({ "features": features, "count": count, "stats": stats })))
}

pub async fn create_feature(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreateFeatureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut feature = Feature::new_work_item(req.description, req.category, req.kind, req.priority);
    feature.branch_hint = req.branch_hint;
    feature.file_patterns = req.file_patterns;
    let feature = ijoka_core::feature_store::create(&state.gw, feature, state.project.id).await?;
    if let Some(steps) = req.steps {
        ijoka_core::plan_step::set_plan(&state.gw, feature.id, steps).await?;
    }
    let feature = ijoka_core::feature_store::get(&state.gw, feature.id).await?;
    Ok(Json(json!({ "feature": feature })))
}

pub async fn get_feature(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let feature = ijoka_core::feature_store::get(&state.gw, id).await?;
    Ok(Json(json!({ "feature": feature })))
}

pub async fn update_feature(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateFeatureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut feature = ijoka_core::feature_store::get(&state.gw, id).await?;
    if let Some(d) = req.description {
        feature.description = d;
    }
    if let Some(c) = req.category {
        feature.category = c;
    }
    if let Some(p) = req.priority {
        feature.priority = p;
    }
    if let Some(fp) = req.file_patterns {
        feature.file_patterns = fp;
    }
    if req.branch_hint.is_some() {
        feature.branch_hint = req.branch_hint;
    }
    feature.updated_at = chrono::Utc::now();
    ijoka_core::feature_store::update(&state.gw, feature.clone()).await?;
    Ok(Json(json!({ "feature": feature })))
}

pub async fn delete_feature(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ijoka_core::feature_store::delete(&state.gw, id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Mints a fresh `session_id` per call. HTTP is stateless between requests
/// so claim continuity (re-claiming the same Session-Work across calls)
/// is a CLI-only concern -- `ijoka-cli` persists one session id per process
/// and passes it straight to `claim_arbiter` instead of going through here.
pub async fn start_feature(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Query(q): Query<StartFeatureQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = Uuid::new_v4();
    let feature = ijoka_core::claim_arbiter::start_feature(
        &state.gw,
        id,
        &q.agent,
        session_id,
        q.force_override,
        state.config.general.stale_threshold_minutes,
    )
    .await?;
    Ok(Json(json!({ "feature": feature })))
}

pub async fn start_next_feature(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<StartFeatureQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(next) = ijoka_core::claim_arbiter::next_claimable_feature(&state.gw, state.project.id).await? else {
        return Err(ApiError::BadRequest("no pending feature available".into()));
    };
    let session_id = Uuid::new_v4();
    let feature = ijoka_core::claim_arbiter::start_feature(
        &state.gw,
        next.id,
        &q.agent,
        session_id,
        q.force_override,
        state.config.general.stale_threshold_minutes,
    )
    .await?;
    Ok(Json(json!({ "feature": feature })))
}

pub async fn complete_feature(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Query(q): Query<CompleteFeatureQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let feature = ijoka_core::claim_arbiter::complete_feature(&state.gw, id, None).await?;
    if let Some(summary) = q.summary {
        tracing::info!(feature_id = %id, %summary, "feature completed");
    }
    Ok(Json(json!({ "feature": feature })))
}

pub async fn block_feature(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<BlockFeatureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut feature = ijoka_core::feature_store::get(&state.gw, id).await?;
    let from_status = feature.status;
    feature.block_reason = Some(req.reason.clone());
    ijoka_core::feature_store::update(&state.gw, feature.clone()).await?;

    if let Some(blocking_id) = req.blocking_feature_id {
        ijoka_graph::edges::link(
            &state.gw,
            ijoka_types::EdgeKind::DependsOn,
            id,
            blocking_id,
            Some(json!(ijoka_types::DependsOnKind::Blocks)),
        )
        .await
        .map_err(ijoka_core::CoreError::from)?;
    }

    // `status_events::append` is the only writer of `Feature.status` (I3);
    // it materialises the transition onto the row itself.
    let status_event = ijoka_types::StatusEvent::new(from_status, FeatureStatus::Blocked, req.reason, None);
    ijoka_graph::nodes::status_events::append(&state.gw, id, status_event)
        .await
        .map_err(ijoka_core::CoreError::from)?;

    feature.status = FeatureStatus::Blocked;
    Ok(Json(json!({ "feature": feature })))
}

pub async fn discover_feature(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<DiscoverFeatureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut request = ijoka_core::discover::DiscoverRequest::new(req.description, req.category, req.kind);
    request.priority = req.priority;
    request.steps = req.steps;
    request.lookback_minutes = req.lookback_minutes;
    request.mark_complete = req.mark_complete;
    request.branch_hint = req.branch_hint;

    let result = ijoka_core::discover::discover_feature(
        &state.gw,
        state.project.id,
        &state.config.attribution.work_tools,
        request,
    )
    .await?;
    Ok(Json(json!({
        "feature": result.feature,
        "re_attributed_count": result.re_attributed_count,
    })))
}

pub async fn get_feature_plan(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    super::plan::plan_response(&state, id).await
}

pub async fn post_feature_plan(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetPlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ijoka_core::plan_step::set_plan(&state.gw, id, req.steps).await?;
    super::plan::plan_response(&state, id).await
}
