//! Router-level tests, same style as the teacher's `at-bridge` test module:
//! build a real `axum::Router` over an in-memory store and drive it with
//! `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ijoka_bridge::{api_router, ApiState};
use ijoka_core::Config;
use ijoka_graph::GraphGateway;
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app() -> axum::Router {
    let gw = GraphGateway::open_in_memory().await.unwrap();
    let project = ijoka_graph::nodes::projects::ensure(&gw, "/repo", "repo").await.unwrap();
    let state = Arc::new(ApiState::new(gw, Config::default(), project));
    api_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn status_on_empty_project_has_no_current_feature() {
    let app = test_app().await;
    let req = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["stats"]["total"], 0);
    assert!(json["current_feature"].is_null());
}

#[tokio::test]
async fn create_then_list_feature_round_trips() {
    let app = test_app().await;

    let create_req = Request::builder()
        .method("POST")
        .uri("/features")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "description": "add login page",
                "category": "ui",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(create_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let feature_id = created["feature"]["id"].as_str().unwrap().to_string();

    let list_req = Request::builder().uri("/features").body(Body::empty()).unwrap();
    let response = app.oneshot(list_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["features"][0]["id"].as_str().unwrap(), feature_id);
}

#[tokio::test]
async fn start_next_with_no_pending_features_is_bad_request() {
    let app = test_app().await;
    let req = Request::builder()
        .method("POST")
        .uri("/features/next/start?agent=claude-code")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_feature_id_is_not_found() {
    let app = test_app().await;
    let req = Request::builder()
        .uri(format!("/features/{}", uuid::Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
