use crate::edges;
use crate::{GraphError, GraphGateway};
use chrono::{DateTime, Utc};
use ijoka_types::{EdgeKind, Event, EventType};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, event_type, tool_name, payload, timestamp, source_agent, session_id, success, summary";

fn type_to_str(t: EventType) -> String {
    serde_json::to_value(t).unwrap().as_str().unwrap().to_string()
}
fn type_from_str(s: &str) -> EventType {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<Event> {
    let payload_json: String = row.get(3)?;
    Ok(Event {
        id: row.get(0)?,
        event_type: type_from_str(&row.get::<_, String>(1)?),
        tool_name: row.get(2)?,
        payload: serde_json::from_str(&payload_json).unwrap_or(serde_json::Value::Null),
        timestamp: row.get::<_, String>(4)?.parse().unwrap(),
        source_agent: row.get(5)?,
        session_id: row.get::<_, String>(6)?.parse().unwrap_or_default(),
        success: row.get::<_, i64>(7)? != 0,
        summary: row.get(8)?,
    })
}

pub async fn get(gw: &GraphGateway, id: &str) -> Result<Option<Event>, GraphError> {
    let id = id.to_string();
    gw.read(move |c| {
        c.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM events WHERE id = ?1"),
            params![id],
            row_to_event,
        )
        .optional()
    })
    .await
}

/// Insert the Event and link `TRIGGERED_BY -> session`, unless an Event
/// with this `id` already exists (invariant I9: idempotent ingestion).
/// Returns `true` if a new Event row was inserted.
pub async fn insert_if_absent(gw: &GraphGateway, event: Event) -> Result<bool, GraphError> {
    if get(gw, &event.id).await?.is_some() {
        return Ok(false);
    }
    let to_insert = event.clone();
    gw.write(move |c| {
        c.execute(
            "INSERT OR IGNORE INTO events (id, event_type, tool_name, payload, timestamp, \
                 source_agent, session_id, success, summary) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                to_insert.id,
                type_to_str(to_insert.event_type),
                to_insert.tool_name,
                to_insert.payload.to_string(),
                to_insert.timestamp.to_rfc3339(),
                to_insert.source_agent,
                to_insert.session_id.to_string(),
                to_insert.success as i64,
                to_insert.summary,
            ],
        )
    })
    .await?;
    edges::link(
        gw,
        EdgeKind::TriggeredBy,
        pseudo_uuid(&event.id),
        event.session_id,
        None,
    )
    .await?;
    Ok(true)
}

/// Link an Event to a Feature, incrementing `Feature.work_count` by 1
/// (spec.md §4.6 "Linking rules"). Idempotent: re-linking the same pair is
/// a no-op and does not double count.
pub async fn link_to_feature(
    gw: &GraphGateway,
    event_id: &str,
    feature_id: Uuid,
) -> Result<bool, GraphError> {
    let event = get(gw, event_id)
        .await?
        .ok_or_else(|| GraphError::NotFound(format!("event {event_id}")))?;
    let src_pseudo = pseudo_uuid(&event.id);
    let inserted = edges::link_if_absent(gw, EdgeKind::LinkedTo, src_pseudo, feature_id).await?;
    Ok(inserted)
}

/// Link an Event `PART_OF_STEP -> step` (spec.md §3). Idempotent, same as
/// `link_to_feature`.
pub async fn link_to_step(gw: &GraphGateway, event_id: &str, step_id: Uuid) -> Result<bool, GraphError> {
    let src_pseudo = pseudo_uuid(event_id);
    edges::link_if_absent(gw, EdgeKind::PartOfStep, src_pseudo, step_id).await
}

/// Number of Events linked `PART_OF_STEP` to `step_id` -- the "< 5 linked
/// events" dwell signal the Stuckness Detector checks (spec.md §4.9).
pub async fn linked_count_for_step(gw: &GraphGateway, step_id: Uuid) -> Result<usize, GraphError> {
    Ok(edges::sources(gw, EdgeKind::PartOfStep, step_id).await?.len())
}

/// Events carry string ids (spec.md §3: `Event.id` may be a derived
/// deterministic string, not a UUID) but the generic edge table is keyed
/// on UUID columns for every other node label. This maps an Event's string
/// id into a stable UUID (v5, namespaced) purely for edge storage; the
/// Event row itself still keys on the original string id.
pub fn pseudo_uuid(event_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, event_id.as_bytes())
}

pub async fn linked_feature_ids(gw: &GraphGateway, event_id: &str) -> Result<Vec<Uuid>, GraphError> {
    edges::targets(gw, EdgeKind::LinkedTo, pseudo_uuid(event_id)).await
}

pub async fn events_linked_to(
    gw: &GraphGateway,
    feature_id: Uuid,
    limit: usize,
) -> Result<Vec<Event>, GraphError> {
    let event_pseudo_ids = edges::sources(gw, EdgeKind::LinkedTo, feature_id).await?;
    let mut events = Vec::new();
    for pseudo in event_pseudo_ids {
        if let Some(ev) = find_by_pseudo(gw, pseudo).await? {
            events.push(ev);
        }
    }
    events.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
    events.truncate(limit);
    Ok(events)
}

async fn find_by_pseudo(gw: &GraphGateway, pseudo: Uuid) -> Result<Option<Event>, GraphError> {
    gw.read(move |c| {
        let mut stmt = c.prepare(&format!("SELECT {SELECT_COLUMNS} FROM events"))?;
        let rows = stmt.query_map([], row_to_event)?;
        for row in rows {
            let ev = row?;
            if pseudo_uuid(&ev.id) == pseudo {
                return Ok(Some(ev));
            }
        }
        Ok(None)
    })
    .await
}

pub async fn recent_for_session(
    gw: &GraphGateway,
    session_id: Uuid,
    limit: usize,
) -> Result<Vec<Event>, GraphError> {
    let session_id = session_id.to_string();
    gw.read(move |c| {
        let mut stmt = c.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM events WHERE session_id = ?1 \
             ORDER BY timestamp DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![session_id, limit as i64], row_to_event)?;
        rows.collect()
    })
    .await
}

/// Events `LINKED_TO` the given Feature whose `tool_name` is in
/// `tool_whitelist` and whose `timestamp > since` -- used by Discover
/// (spec.md §4.10 step 2).
pub async fn linked_work_tool_events_since(
    gw: &GraphGateway,
    feature_id: Uuid,
    tool_whitelist: &[String],
    since: DateTime<Utc>,
) -> Result<Vec<Event>, GraphError> {
    let all = events_linked_to(gw, feature_id, usize::MAX).await?;
    Ok(all
        .into_iter()
        .filter(|e| e.timestamp > since)
        .filter(|e| {
            e.tool_name
                .as_deref()
                .map(|t| tool_whitelist.iter().any(|w| w == t))
                .unwrap_or(false)
        })
        .collect())
}
