//! Axum router construction (spec.md §6), same shape as the teacher's
//! `at-bridge::http_api::router::api_router` -- one `Router::new()` chain,
//! `State(Arc<ApiState>)` everywhere, CORS layered on top. Ijoka names no
//! auth scheme (spec.md §6), so unlike the teacher there is no `AuthLayer`.

use crate::handlers::{analytics, checkpoint, features, insights, plan, status};
use crate::state::ApiState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn api_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/status", get(status::get_status))
        .route("/features", get(features::list_features).post(features::create_feature))
        .route(
            "/features/{id}",
            get(features::get_feature)
                .patch(features::update_feature)
                .delete(features::delete_feature),
        )
        .route("/features/{id}/start", post(features::start_feature))
        .route("/features/next/start", post(features::start_next_feature))
        .route("/features/{id}/complete", post(features::complete_feature))
        .route("/features/{id}/block", post(features::block_feature))
        .route("/features/discover", post(features::discover_feature))
        .route(
            "/features/{id}/plan",
            get(features::get_feature_plan).post(features::post_feature_plan),
        )
        .route("/plan", get(plan::get_plan).post(plan::post_plan))
        .route("/checkpoint", post(checkpoint::checkpoint))
        .route("/insights", get(insights::list_insights).post(insights::create_insight))
        .route("/analytics/patterns", get(analytics::get_patterns))
        .route("/analytics/velocity", get(analytics::get_velocity))
        .route("/analytics/profile/{agent}", get(analytics::get_agent_profile))
        .route("/analytics/query", post(analytics::post_query))
        .route("/analytics/digest", get(analytics::get_digest))
        .route("/analytics/feedback", post(insights::record_feedback))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
