//! Discover / Re-attribution (spec.md §4.10): retroactively surfaces a
//! Feature and links recent Session-Work events to it.

use crate::error::CoreError;
use chrono::{Duration, Utc};
use ijoka_graph::GraphGateway;
use ijoka_types::{EdgeKind, Feature, FeatureCategory, FeatureStatus, StatusEvent, WorkItemType};
use uuid::Uuid;

pub struct DiscoverRequest {
    pub description: String,
    pub category: FeatureCategory,
    pub kind: WorkItemType,
    pub priority: i32,
    pub steps: Option<Vec<String>>,
    pub lookback_minutes: i64,
    pub mark_complete: bool,
    pub branch_hint: Option<String>,
}

impl DiscoverRequest {
    pub fn new(description: impl Into<String>, category: FeatureCategory, kind: WorkItemType) -> Self {
        Self {
            description: description.into(),
            category,
            kind,
            priority: 0,
            steps: None,
            lookback_minutes: 60,
            mark_complete: false,
            branch_hint: None,
        }
    }
}

pub struct DiscoverResult {
    pub feature: Feature,
    pub re_attributed_count: u64,
}

/// `discover_feature` (spec.md §4.10, 5 steps).
pub async fn discover_feature(
    gw: &GraphGateway,
    project_id: Uuid,
    work_tool_whitelist: &[String],
    request: DiscoverRequest,
) -> Result<DiscoverResult, CoreError> {
    // 1. Create the Feature (in_progress unless mark_complete).
    let mut feature =
        Feature::new_work_item(request.description.clone(), request.category, request.kind, request.priority);
    feature.branch_hint = request.branch_hint;
    let feature = ijoka_graph::nodes::features::create(gw, feature, project_id).await?;

    if let Some(steps) = request.steps {
        ijoka_graph::nodes::steps::set_plan(gw, feature.id, steps).await?;
    }

    // 2. Find Session-Work events in the lookback window using the
    //    work-tools whitelist.
    let session_work = ijoka_graph::nodes::features::session_work_for_project(gw, project_id).await?;
    let mut re_attributed = 0u64;

    if let Some(session_work) = session_work {
        let since = Utc::now() - Duration::minutes(request.lookback_minutes);
        let candidates = ijoka_graph::nodes::events::linked_work_tool_events_since(
            gw,
            session_work.id,
            work_tool_whitelist,
            since,
        )
        .await?;

        // 3. MERGE a new LINKED_TO edge per candidate (idempotent; the
        //    Session-Work edge is left untouched).
        for event in &candidates {
            let added = ijoka_graph::edges::link_if_absent(
                gw,
                EdgeKind::LinkedTo,
                ijoka_graph::nodes::events::pseudo_uuid(&event.id),
                feature.id,
            )
            .await?;
            if added {
                re_attributed += 1;
            }
        }
    }

    // 4. Increment work_count by the number of edges added.
    let mut feature = feature;
    if re_attributed > 0 {
        feature.work_count += re_attributed;
        ijoka_graph::nodes::features::save(gw, feature.clone()).await?;
    }

    // 5. mark_complete short-circuits auto-starting.
    if request.mark_complete {
        let status_event = StatusEvent::new(FeatureStatus::Pending, FeatureStatus::Complete, "discover:mark_complete", None);
        ijoka_graph::nodes::status_events::append(gw, feature.id, status_event).await?;
    } else if re_attributed > 0 {
        let first_event_id = "discover".to_string();
        let status_event = StatusEvent::new(
            FeatureStatus::Pending,
            FeatureStatus::InProgress,
            format!("auto:first_activity:{first_event_id}"),
            None,
        );
        ijoka_graph::nodes::status_events::append(gw, feature.id, status_event).await?;
    }

    let feature = ijoka_graph::nodes::features::require(gw, feature.id).await?;
    Ok(DiscoverResult {
        feature,
        re_attributed_count: re_attributed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::{Event, EventType};

    #[tokio::test]
    async fn discover_re_attributes_recent_session_work_events() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
        let session_work = ijoka_graph::nodes::features::create(
            &gw,
            Feature::new_session_work("p"),
            project.id,
        )
        .await
        .unwrap();

        let session_id = Uuid::new_v4();
        let event = Event {
            id: Event::deterministic_id(session_id, EventType::ToolCall, Some("README.md")),
            event_type: EventType::ToolCall,
            tool_name: Some("Edit".into()),
            payload: serde_json::json!({"file_path": "/p/README.md"}),
            timestamp: Utc::now(),
            source_agent: "claude".into(),
            session_id,
            success: true,
            summary: "edited README".into(),
        };
        ijoka_graph::nodes::events::insert_if_absent(&gw, event.clone()).await.unwrap();
        ijoka_graph::nodes::events::link_to_feature(&gw, &event.id, session_work.id).await.unwrap();

        let whitelist = vec!["Edit".to_string()];
        let request = DiscoverRequest::new("README edits", FeatureCategory::Documentation, WorkItemType::Feature);
        let result = discover_feature(&gw, project.id, &whitelist, request).await.unwrap();

        assert_eq!(result.re_attributed_count, 1);
        assert_eq!(result.feature.work_count, 1);
        assert_eq!(result.feature.status, FeatureStatus::InProgress);

        let linked_ids = ijoka_graph::nodes::events::linked_feature_ids(&gw, &event.id).await.unwrap();
        assert_eq!(linked_ids.len(), 2);
        assert!(linked_ids.contains(&session_work.id));
        assert!(linked_ids.contains(&result.feature.id));
    }
}
