//! End-to-end scenarios wiring the Graph Store Gateway through
//! `ijoka-core`'s hook ingestion, Claim Arbiter, Plan/Step Engine, and
//! Discover/Re-attribution -- no network, no real process, exercising the
//! public async API the same way an adapter would.

use chrono::{Duration, Utc};
use ijoka_core::config::Config;
use ijoka_core::discover::DiscoverRequest;
use ijoka_core::hooks::{self, ToolCallContext};
use ijoka_core::{claim_arbiter, discover, plan_step};
use ijoka_graph::GraphGateway;
use ijoka_types::{CompletionCriteria, Feature, FeatureCategory, FeatureStatus, WorkItemType};
use uuid::Uuid;

#[tokio::test]
async fn scenario_1_session_work_fallback() {
    let gw = GraphGateway::open_in_memory().await.unwrap();
    let config = Config::default();
    let session_id = Uuid::new_v4();

    let (project, session) = hooks::session_start(&gw, session_id, "claude", "/p", false, None)
        .await
        .unwrap();

    let ctx = ToolCallContext {
        session_id,
        cwd: "/p",
        tool_name: Some("Edit"),
        command: None,
        file_path: Some("/p/README.md"),
        success: true,
        user_prompt: None,
    };
    hooks::post_tool_use(&gw, &project, &session, &config, &ctx).await.unwrap();

    let sw = ijoka_graph::nodes::features::session_work_for_project(&gw, project.id)
        .await
        .unwrap()
        .expect("a Session-Work feature must exist");
    assert_eq!(sw.work_count, 1);
    assert_eq!(sw.status, FeatureStatus::Pending, "I7: Session-Work never auto-transitions");

    let all = ijoka_graph::nodes::features::list_for_project(&gw, project.id, None)
        .await
        .unwrap();
    assert_eq!(
        all.iter().filter(|f| f.is_session_work).count(),
        1,
        "I1: at most one Session-Work feature per project"
    );
}

#[tokio::test]
async fn scenario_2_discover_re_attribution() {
    let gw = GraphGateway::open_in_memory().await.unwrap();
    let config = Config::default();
    let session_id = Uuid::new_v4();

    let (project, session) = hooks::session_start(&gw, session_id, "claude", "/p", false, None)
        .await
        .unwrap();
    let ctx = ToolCallContext {
        session_id,
        cwd: "/p",
        tool_name: Some("Edit"),
        command: None,
        file_path: Some("/p/README.md"),
        success: true,
        user_prompt: None,
    };
    hooks::post_tool_use(&gw, &project, &session, &config, &ctx).await.unwrap();

    let request = DiscoverRequest::new("README edits", FeatureCategory::Documentation, WorkItemType::Feature);
    let result = discover::discover_feature(&gw, project.id, &config.attribution.work_tools, request)
        .await
        .unwrap();

    assert_eq!(result.re_attributed_count, 1);
    assert_eq!(result.feature.work_count, 1);
    assert_eq!(result.feature.status, FeatureStatus::InProgress);

    let event_id = ijoka_types::Event::deterministic_id(session_id, ijoka_types::EventType::ToolCall, Some("Edit"));
    let linked = ijoka_graph::nodes::events::linked_feature_ids(&gw, &event_id).await.unwrap();
    assert_eq!(linked.len(), 2, "Session-Work edge preserved alongside the new Feature edge");
    assert!(linked.contains(&result.feature.id));

    let history = ijoka_graph::nodes::status_events::history_for_feature(&gw, result.feature.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_status, FeatureStatus::InProgress);
    assert!(history[0].by.starts_with("auto:first_activity"));
}

#[tokio::test]
async fn scenario_3_claim_conflict() {
    let gw = GraphGateway::open_in_memory().await.unwrap();
    let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
    let feature = ijoka_graph::nodes::features::create(
        &gw,
        Feature::new_work_item("parser", FeatureCategory::Functional, WorkItemType::Feature, 0),
        project.id,
    )
    .await
    .unwrap();

    let s1 = ijoka_graph::nodes::sessions::start_session(&gw, Uuid::new_v4(), "claude", project.id, false, None)
        .await
        .unwrap();
    let s2 = ijoka_graph::nodes::sessions::start_session(&gw, Uuid::new_v4(), "claude", project.id, false, None)
        .await
        .unwrap();

    let claimed = claim_arbiter::start_feature(&gw, feature.id, "A1", s1.id, false, 30)
        .await
        .unwrap();
    assert_eq!(claimed.claiming_session_id, Some(s1.id));

    let conflict = claim_arbiter::start_feature(&gw, feature.id, "A2", s2.id, false, 30).await;
    assert!(matches!(conflict, Err(ijoka_core::CoreError::ClaimConflict { .. })));

    let unchanged = ijoka_graph::nodes::features::require(&gw, feature.id).await.unwrap();
    assert_eq!(unchanged.claiming_session_id, Some(s1.id));
}

#[tokio::test]
async fn scenario_4_stale_override() {
    let gw = GraphGateway::open_in_memory().await.unwrap();
    let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
    let feature = ijoka_graph::nodes::features::create(
        &gw,
        Feature::new_work_item("parser", FeatureCategory::Functional, WorkItemType::Feature, 0),
        project.id,
    )
    .await
    .unwrap();

    let mut s1 = ijoka_graph::nodes::sessions::start_session(&gw, Uuid::new_v4(), "claude", project.id, false, None)
        .await
        .unwrap();
    let s2 = ijoka_graph::nodes::sessions::start_session(&gw, Uuid::new_v4(), "claude", project.id, false, None)
        .await
        .unwrap();

    claim_arbiter::start_feature(&gw, feature.id, "A1", s1.id, false, 30).await.unwrap();

    s1.last_activity = Utc::now() - Duration::hours(2);
    ijoka_graph::nodes::sessions::save(&gw, s1.clone()).await.unwrap();

    let overridden = claim_arbiter::start_feature(&gw, feature.id, "A2", s2.id, false, 30)
        .await
        .unwrap();
    assert_eq!(overridden.claiming_session_id, Some(s2.id));
}

#[tokio::test]
async fn scenario_5_plan_checkpoint_drift() {
    let gw = GraphGateway::open_in_memory().await.unwrap();
    let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
    let feature = ijoka_graph::nodes::features::create(
        &gw,
        Feature::new_work_item("parser", FeatureCategory::Functional, WorkItemType::Feature, 0),
        project.id,
    )
    .await
    .unwrap();

    plan_step::set_plan(&gw, feature.id, vec!["Write parser".into(), "Write tests".into()])
        .await
        .unwrap();
    let steps = plan_step::get_plan(&gw, feature.id).await.unwrap();
    let mut first = steps[0].clone();
    first.start(Utc::now());
    ijoka_graph::nodes::steps::save(&gw, first).await.unwrap();

    let result = plan_step::checkpoint(&gw, feature.id, None, Some("update UI colours"))
        .await
        .unwrap();
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("drift"));

    let steps_after = plan_step::get_plan(&gw, feature.id).await.unwrap();
    assert_eq!(steps_after[0].status, ijoka_types::StepStatus::InProgress, "drift check must not mutate step state");
}

#[tokio::test]
async fn scenario_6_auto_complete_by_work_count() {
    let gw = GraphGateway::open_in_memory().await.unwrap();
    let config = Config::default();
    let session_id = Uuid::new_v4();

    let (project, session) = hooks::session_start(&gw, session_id, "claude", "/p", false, None)
        .await
        .unwrap();

    let mut feature = Feature::new_work_item("parser", FeatureCategory::Functional, WorkItemType::Feature, 0);
    feature.completion_criteria = Some(CompletionCriteria::WorkCount { threshold: 3 });
    let feature = ijoka_graph::nodes::features::create(&gw, feature, project.id).await.unwrap();

    let next_pending = ijoka_graph::nodes::features::create(
        &gw,
        Feature::new_work_item("next up", FeatureCategory::Functional, WorkItemType::Feature, 10),
        project.id,
    )
    .await
    .unwrap();

    claim_arbiter::start_feature(&gw, feature.id, "claude", session_id, false, 30)
        .await
        .unwrap();
    let mut session = ijoka_graph::nodes::sessions::get(&gw, session_id).await.unwrap().unwrap();
    session.active_feature_id = Some(feature.id);
    ijoka_graph::nodes::sessions::save(&gw, session.clone()).await.unwrap();

    for i in 0..3 {
        let file = format!("/p/src/file_{i}.rs");
        let ctx = ToolCallContext {
            session_id,
            cwd: "/p",
            tool_name: Some("Edit"),
            command: None,
            file_path: Some(&file),
            success: true,
            user_prompt: None,
        };
        hooks::post_tool_use(&gw, &project, &session, &config, &ctx).await.unwrap();
    }

    let completed = ijoka_graph::nodes::features::require(&gw, feature.id).await.unwrap();
    assert_eq!(completed.status, FeatureStatus::Complete);

    let history = ijoka_graph::nodes::status_events::history_for_feature(&gw, feature.id)
        .await
        .unwrap();
    assert!(history
        .iter()
        .any(|e| e.from_status == FeatureStatus::InProgress && e.to_status == FeatureStatus::Complete));

    let activated = ijoka_graph::nodes::features::require(&gw, next_pending.id).await.unwrap();
    assert_eq!(activated.status, FeatureStatus::InProgress, "highest-priority pending feature auto-activates");
}
