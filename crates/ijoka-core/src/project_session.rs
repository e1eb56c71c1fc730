//! Project & Session Layer (spec.md §4.3): thin wrappers over
//! `ijoka-graph`'s node operations that add the higher-level semantics
//! (idempotent ensure, ancestry linking, activity bookkeeping) the spec
//! calls for.

use crate::error::CoreError;
use ijoka_graph::GraphGateway;
use ijoka_types::{Project, Session};
use uuid::Uuid;

/// Idempotent: canonicalisation of `path` to a git-root is the adapter's
/// responsibility (spec.md §4.3); this just upserts by path.
pub async fn ensure_project(gw: &GraphGateway, path: &str, name: &str) -> Result<Project, CoreError> {
    let project = ijoka_graph::nodes::projects::ensure(gw, path, name).await?;
    Ok(project)
}

/// Upserts the Session, links `IN_PROJECT`, records `start_commit`, and
/// links `CONTINUED_FROM` to the latest prior session in the project (if
/// any, and not itself).
pub async fn start_session(
    gw: &GraphGateway,
    session_id: Uuid,
    agent: &str,
    project_id: Uuid,
    is_subagent: bool,
    start_commit: Option<String>,
) -> Result<Session, CoreError> {
    let session =
        ijoka_graph::nodes::sessions::start_session(gw, session_id, agent, project_id, is_subagent, start_commit)
            .await?;
    Ok(session)
}

pub async fn end_session(gw: &GraphGateway, session_id: Uuid) -> Result<Session, CoreError> {
    ijoka_graph::nodes::sessions::end_session(gw, session_id).await?;
    get_session(gw, session_id).await
}

/// Called by the ingestion pipeline on every event: refreshes
/// `last_activity` and increments `event_count`.
pub async fn update_session_activity(gw: &GraphGateway, session_id: Uuid) -> Result<Session, CoreError> {
    let session = ijoka_graph::nodes::sessions::update_activity(gw, session_id).await?;
    Ok(session)
}

pub async fn get_session(gw: &GraphGateway, session_id: Uuid) -> Result<Session, CoreError> {
    ijoka_graph::nodes::sessions::get(gw, session_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("session {session_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_project_is_idempotent() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let p1 = ensure_project(&gw, "/repo", "repo").await.unwrap();
        let p2 = ensure_project(&gw, "/repo", "repo").await.unwrap();
        assert_eq!(p1.id, p2.id);
    }

    #[tokio::test]
    async fn start_session_links_continued_from() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ensure_project(&gw, "/repo", "repo").await.unwrap();
        let s1 = start_session(&gw, Uuid::new_v4(), "claude", project.id, false, Some("abc123".into()))
            .await
            .unwrap();
        end_session(&gw, s1.id).await.unwrap();
        let s2 = start_session(&gw, Uuid::new_v4(), "claude", project.id, false, None)
            .await
            .unwrap();
        assert_eq!(s2.start_commit, None);
        assert_ne!(s1.id, s2.id);
    }
}
