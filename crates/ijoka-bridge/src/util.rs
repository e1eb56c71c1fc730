//! Small cross-handler helpers.

use crate::api_error::ApiError;
use crate::state::ApiState;
use ijoka_types::{Feature, FeatureStatus};

/// The feature the bare (non-`{id}`-scoped) `/plan` and `/checkpoint`
/// routes operate on: the Project's currently-claimed, non-Session-Work
/// Feature (spec.md §6 names no id for these routes; same definition
/// `GET /status` uses for its `current_feature`).
pub async fn current_feature(state: &ApiState) -> Result<Feature, ApiError> {
    let features = ijoka_core::feature_store::list(&state.gw, state.project.id, None).await?;
    features
        .into_iter()
        .filter(|f| !f.is_session_work && f.status == FeatureStatus::InProgress)
        .max_by_key(|f| f.claimed_at)
        .ok_or_else(|| ApiError::NotFound("no feature currently in progress".into()))
}
