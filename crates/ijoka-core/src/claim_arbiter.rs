//! Claim Arbiter (spec.md §4.5): the per-feature lease protocol that lets
//! multiple concurrent agent sessions work on the same Project without
//! stepping on the same Feature.

use crate::error::{claim_conflict, CoreError};
use chrono::{Duration, Utc};
use ijoka_graph::GraphGateway;
use ijoka_types::{Feature, FeatureStatus, StatusEvent};
use uuid::Uuid;

pub const DEFAULT_STALE_THRESHOLD_MINUTES: i64 = 30;

/// A Session is active if it has any event within the stale threshold
/// (spec.md §4.5); falls back to the Session node's `last_activity` --
/// callers that only have a Session id go through `project_session`.
fn session_is_active(last_activity: chrono::DateTime<Utc>, now: chrono::DateTime<Utc>, threshold_minutes: i64) -> bool {
    now - last_activity <= Duration::minutes(threshold_minutes)
}

/// `start_feature` (spec.md §4.5 steps 1-6).
pub async fn start_feature(
    gw: &GraphGateway,
    feature_id: Uuid,
    agent: &str,
    session_id: Uuid,
    force_override: bool,
    stale_threshold_minutes: i64,
) -> Result<Feature, CoreError> {
    let mut feature = ijoka_graph::nodes::features::require(gw, feature_id).await?;
    let now = Utc::now();

    match feature.claiming_session_id {
        None => {}
        Some(holder) if holder == session_id => {}
        Some(holder) => {
            let holder_session = ijoka_graph::nodes::sessions::get(gw, holder).await?;
            let holder_active = match holder_session {
                Some(s) => session_is_active(s.last_activity, now, stale_threshold_minutes),
                None => {
                    // Session node missing: fall back to the holder's most
                    // recent Event instead of treating it as stale.
                    let recent = ijoka_graph::nodes::events::recent_for_session(gw, holder, 1).await?;
                    recent
                        .first()
                        .map(|e| session_is_active(e.timestamp, now, stale_threshold_minutes))
                        .unwrap_or(false)
                }
            };
            if holder_active && !force_override {
                return Err(claim_conflict(
                    feature_id,
                    holder,
                    feature.claiming_agent.as_deref().unwrap_or("unknown"),
                ));
            }
        }
    }

    let from_status = feature.status;
    feature.status = FeatureStatus::InProgress;
    feature.claiming_session_id = Some(session_id);
    feature.claiming_agent = Some(agent.to_string());
    feature.claimed_at = Some(now);
    feature.updated_at = now;
    ijoka_graph::nodes::features::save(gw, feature.clone()).await?;

    let status_event = StatusEvent::new(
        from_status,
        FeatureStatus::InProgress,
        format!("start:{agent}"),
        Some(session_id),
    );
    ijoka_graph::nodes::status_events::append(gw, feature_id, status_event).await?;

    Ok(feature)
}

/// Tie-break for `start_feature` without a `feature_id` (spec.md §4.5):
/// the next pending Feature whose blocking dependencies are all complete,
/// ordered by `priority desc, created_at asc`.
pub async fn next_claimable_feature(
    gw: &GraphGateway,
    project_id: Uuid,
) -> Result<Option<Feature>, CoreError> {
    let pending = ijoka_graph::nodes::features::list_for_project(gw, project_id, Some(FeatureStatus::Pending)).await?;
    let mut candidates = Vec::new();
    for feature in pending {
        if feature.is_session_work {
            continue;
        }
        if blocking_deps_complete(gw, feature.id).await? {
            candidates.push(feature);
        }
    }
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.created_at.cmp(&b.created_at)));
    Ok(candidates.into_iter().next())
}

async fn blocking_deps_complete(gw: &GraphGateway, feature_id: Uuid) -> Result<bool, CoreError> {
    let targets =
        ijoka_graph::edges::targets_with_props(gw, ijoka_types::EdgeKind::DependsOn, feature_id).await?;
    for (dep_id, props) in targets {
        let kind: ijoka_types::DependsOnKind = props
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or(ijoka_types::DependsOnKind::Related);
        if kind != ijoka_types::DependsOnKind::Blocks {
            continue;
        }
        let dep = ijoka_graph::nodes::features::require(gw, dep_id).await?;
        if dep.status != FeatureStatus::Complete {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `complete_feature` (spec.md §4.5): writes `status=complete`, clears the
/// claim triple, stamps `completed_at`, emits a StatusEvent.
pub async fn complete_feature(
    gw: &GraphGateway,
    feature_id: Uuid,
    session_id: Option<Uuid>,
) -> Result<Feature, CoreError> {
    let mut feature = ijoka_graph::nodes::features::require(gw, feature_id).await?;
    let now = Utc::now();
    let from_status = feature.status;

    feature.status = FeatureStatus::Complete;
    feature.claiming_session_id = None;
    feature.claiming_agent = None;
    feature.claimed_at = None;
    feature.completed_at = Some(now);
    feature.updated_at = now;
    ijoka_graph::nodes::features::save(gw, feature.clone()).await?;

    let status_event = StatusEvent::new(from_status, FeatureStatus::Complete, "complete", session_id);
    ijoka_graph::nodes::status_events::append(gw, feature_id, status_event).await?;

    Ok(feature)
}

/// Auto-transition pending -> in_progress, fired exactly once per Feature
/// on the first `LINKED_TO` edge (spec.md §4.6 "Linking rules"). Never
/// fires for Session-Work (I7) or for Features already past `pending`.
pub async fn maybe_auto_transition(
    gw: &GraphGateway,
    feature: &Feature,
    event_id: &str,
) -> Result<bool, CoreError> {
    if feature.is_session_work || feature.status != FeatureStatus::Pending {
        return Ok(false);
    }
    let status_event = StatusEvent::new(
        FeatureStatus::Pending,
        FeatureStatus::InProgress,
        format!("auto:first_activity:{event_id}"),
        None,
    );
    ijoka_graph::nodes::status_events::append(gw, feature.id, status_event).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::{FeatureCategory, WorkItemType};

    async fn setup_feature(gw: &GraphGateway) -> Uuid {
        let project = ijoka_graph::nodes::projects::ensure(gw, "/repo", "repo").await.unwrap();
        let f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0);
        ijoka_graph::nodes::features::create(gw, f, project.id).await.unwrap().id
    }

    #[tokio::test]
    async fn start_feature_succeeds_when_unclaimed() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = setup_feature(&gw).await;
        let session_id = Uuid::new_v4();
        let f = start_feature(&gw, feature_id, "A1", session_id, false, 30).await.unwrap();
        assert_eq!(f.claiming_session_id, Some(session_id));
        assert_eq!(f.status, FeatureStatus::InProgress);
    }

    #[tokio::test]
    async fn start_feature_conflicts_on_active_different_session() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = setup_feature(&gw).await;
        let s1 = Uuid::new_v4();
        start_feature(&gw, feature_id, "A1", s1, false, 30).await.unwrap();
        ijoka_graph::nodes::sessions::start_session(&gw, s1, "A1", Uuid::nil(), false, None)
            .await
            .ok();

        // Make the session appear active via a fresh upsert with recent last_activity.
        let mut holder = ijoka_types::Session::new(s1, "A1", false);
        holder.last_activity = Utc::now();
        ijoka_graph::nodes::sessions::save(&gw, holder).await.unwrap();

        let s2 = Uuid::new_v4();
        let result = start_feature(&gw, feature_id, "A2", s2, false, 30).await;
        assert!(matches!(result, Err(CoreError::ClaimConflict { .. })));
    }

    #[tokio::test]
    async fn start_feature_overrides_stale_claim() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = setup_feature(&gw).await;
        let s1 = Uuid::new_v4();
        start_feature(&gw, feature_id, "A1", s1, false, 30).await.unwrap();

        let mut holder = ijoka_types::Session::new(s1, "A1", false);
        holder.last_activity = Utc::now() - Duration::hours(2);
        ijoka_graph::nodes::sessions::save(&gw, holder).await.unwrap();

        let s2 = Uuid::new_v4();
        let f = start_feature(&gw, feature_id, "A2", s2, false, 30).await.unwrap();
        assert_eq!(f.claiming_session_id, Some(s2));
    }

    #[tokio::test]
    async fn complete_feature_clears_claim() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = setup_feature(&gw).await;
        let session_id = Uuid::new_v4();
        start_feature(&gw, feature_id, "A1", session_id, false, 30).await.unwrap();
        let completed = complete_feature(&gw, feature_id, Some(session_id)).await.unwrap();
        assert_eq!(completed.status, FeatureStatus::Complete);
        assert!(completed.claiming_session_id.is_none());
    }
}
