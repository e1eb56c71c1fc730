use crate::edges;
use crate::{GraphError, GraphGateway};
use ijoka_types::{EdgeKind, Session, SessionStatus};
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeSet;
use uuid::Uuid;

fn status_to_str(s: SessionStatus) -> &'static str {
    match s {
        SessionStatus::Active => "active",
        SessionStatus::Ended => "ended",
        SessionStatus::Stale => "stale",
    }
}

fn status_from_str(s: &str) -> SessionStatus {
    match s {
        "ended" => SessionStatus::Ended,
        "stale" => SessionStatus::Stale,
        _ => SessionStatus::Active,
    }
}

fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<Session> {
    let nudges_json: String = row.get(12)?;
    let nudges_shown: BTreeSet<String> = serde_json::from_str(&nudges_json).unwrap_or_default();
    Ok(Session {
        id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
        agent: row.get(1)?,
        status: status_from_str(&row.get::<_, String>(2)?),
        started_at: row.get::<_, String>(3)?.parse().unwrap(),
        last_activity: row.get::<_, String>(4)?.parse().unwrap(),
        ended_at: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| s.parse().ok()),
        event_count: row.get::<_, i64>(6)? as u64,
        is_subagent: row.get::<_, i64>(7)? != 0,
        start_commit: row.get(8)?,
        active_feature_id: row
            .get::<_, Option<String>>(9)?
            .and_then(|s| s.parse().ok()),
        classified_at: row
            .get::<_, Option<String>>(10)?
            .and_then(|s| s.parse().ok()),
        classification_source: row.get(11)?,
        last_prompt: row.get(13)?,
        nudges_shown,
    })
}

const SELECT_COLUMNS: &str = "id, agent, status, started_at, last_activity, ended_at, \
     event_count, is_subagent, start_commit, active_feature_id, classified_at, \
     classification_source, nudges_shown, last_prompt";

pub async fn get(gw: &GraphGateway, id: Uuid) -> Result<Option<Session>, GraphError> {
    gw.read(move |c| {
        c.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM sessions WHERE id = ?1"),
            params![id.to_string()],
            row_to_session,
        )
        .optional()
    })
    .await
}

/// Most recently started Session in a Project, used to link
/// `CONTINUED_FROM` on `start_session` (spec.md §4.3).
pub async fn latest_in_project(
    gw: &GraphGateway,
    project_id: Uuid,
) -> Result<Option<Session>, GraphError> {
    let project_id = project_id.to_string();
    gw.read(move |c| {
        c.query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM sessions s \
                 JOIN edges e ON e.kind = 'IN_PROJECT' AND e.src_id = s.id \
                 WHERE e.dst_id = ?1 \
                 ORDER BY s.started_at DESC LIMIT 1"
            ),
            params![project_id],
            row_to_session,
        )
        .optional()
    })
    .await
}

fn upsert(c: &rusqlite::Connection, s: &Session) -> rusqlite::Result<()> {
    c.execute(
        "INSERT INTO sessions (id, agent, status, started_at, last_activity, ended_at, \
             event_count, is_subagent, start_commit, active_feature_id, classified_at, \
             classification_source, nudges_shown, last_prompt) \
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14) \
         ON CONFLICT(id) DO UPDATE SET \
             agent=excluded.agent, status=excluded.status, started_at=excluded.started_at, \
             last_activity=excluded.last_activity, ended_at=excluded.ended_at, \
             event_count=excluded.event_count, is_subagent=excluded.is_subagent, \
             start_commit=excluded.start_commit, active_feature_id=excluded.active_feature_id, \
             classified_at=excluded.classified_at, classification_source=excluded.classification_source, \
             nudges_shown=excluded.nudges_shown, last_prompt=excluded.last_prompt",
        params![
            s.id.to_string(),
            s.agent,
            status_to_str(s.status),
            s.started_at.to_rfc3339(),
            s.last_activity.to_rfc3339(),
            s.ended_at.map(|t| t.to_rfc3339()),
            s.event_count as i64,
            s.is_subagent as i64,
            s.start_commit,
            s.active_feature_id.map(|u| u.to_string()),
            s.classified_at.map(|t| t.to_rfc3339()),
            s.classification_source,
            serde_json::to_string(&s.nudges_shown).unwrap(),
            s.last_prompt,
        ],
    )?;
    Ok(())
}

pub async fn save(gw: &GraphGateway, session: Session) -> Result<(), GraphError> {
    gw.write(move |c| upsert(c, &session)).await
}

/// `start_session` (spec.md §4.3): upsert with status=active, link
/// `IN_PROJECT`, and link `CONTINUED_FROM` to the latest prior session in
/// the project, if any.
pub async fn start_session(
    gw: &GraphGateway,
    session_id: Uuid,
    agent: &str,
    project_id: Uuid,
    is_subagent: bool,
    start_commit: Option<String>,
) -> Result<Session, GraphError> {
    let predecessor = latest_in_project(gw, project_id).await?;
    let mut session = Session::new(session_id, agent, is_subagent);
    session.start_commit = start_commit;
    save(gw, session.clone()).await?;
    edges::link(gw, EdgeKind::InProject, session_id, project_id, None).await?;
    if let Some(prev) = predecessor {
        if prev.id != session_id {
            edges::link(gw, EdgeKind::ContinuedFrom, session_id, prev.id, None).await?;
        }
    }
    Ok(session)
}

pub async fn end_session(gw: &GraphGateway, session_id: Uuid) -> Result<(), GraphError> {
    let Some(mut session) = get(gw, session_id).await? else {
        return Err(GraphError::NotFound(format!("session {session_id}")));
    };
    session.end(chrono::Utc::now());
    save(gw, session).await
}

pub async fn update_activity(gw: &GraphGateway, session_id: Uuid) -> Result<Session, GraphError> {
    let Some(mut session) = get(gw, session_id).await? else {
        return Err(GraphError::NotFound(format!("session {session_id}")));
    };
    session.record_event(chrono::Utc::now());
    save(gw, session.clone()).await?;
    Ok(session)
}
