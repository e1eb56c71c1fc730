use crate::{GraphError, GraphGateway};
use ijoka_types::{FeatureStatus, StatusEvent};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

fn status_to_str(s: FeatureStatus) -> String {
    serde_json::to_value(s).unwrap().as_str().unwrap().to_string()
}
fn status_from_str(s: &str) -> FeatureStatus {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}

fn row_to_status_event(row: &rusqlite::Row) -> rusqlite::Result<StatusEvent> {
    Ok(StatusEvent {
        id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
        from_status: status_from_str(&row.get::<_, String>(1)?),
        to_status: status_from_str(&row.get::<_, String>(2)?),
        at: row.get::<_, String>(3)?.parse().unwrap(),
        by: row.get(4)?,
        session_id: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| s.parse().ok()),
        reason: row.get(6)?,
    })
}

/// Appends a StatusEvent and materialises the new status onto the Feature
/// row (invariant I3: `Feature.status` is a view over the latest
/// StatusEvent -- we write both in the same transaction for read
/// efficiency, but this function is the only writer of either).
pub async fn append(
    gw: &GraphGateway,
    feature_id: Uuid,
    status_event: StatusEvent,
) -> Result<(), GraphError> {
    let se = status_event;
    let feature_id_s = feature_id.to_string();
    gw.write(move |c| {
        c.execute(
            "INSERT INTO status_events (id, feature_id, from_status, to_status, at, by, \
                 session_id, reason) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                se.id.to_string(),
                feature_id_s,
                status_to_str(se.from_status),
                status_to_str(se.to_status),
                se.at.to_rfc3339(),
                se.by,
                se.session_id.map(|u| u.to_string()),
                se.reason,
            ],
        )?;
        c.execute(
            "UPDATE features SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                status_to_str(se.to_status),
                se.at.to_rfc3339(),
                feature_id_s,
            ],
        )?;
        Ok(())
    })
    .await
}

pub async fn latest_for_feature(
    gw: &GraphGateway,
    feature_id: Uuid,
) -> Result<Option<StatusEvent>, GraphError> {
    let feature_id = feature_id.to_string();
    gw.read(move |c| {
        c.query_row(
            "SELECT id, from_status, to_status, at, by, session_id, reason \
             FROM status_events WHERE feature_id = ?1 ORDER BY at DESC LIMIT 1",
            params![feature_id],
            row_to_status_event,
        )
        .optional()
    })
    .await
}

pub async fn history_for_feature(
    gw: &GraphGateway,
    feature_id: Uuid,
) -> Result<Vec<StatusEvent>, GraphError> {
    let feature_id = feature_id.to_string();
    gw.read(move |c| {
        let mut stmt = c.prepare(
            "SELECT id, from_status, to_status, at, by, session_id, reason \
             FROM status_events WHERE feature_id = ?1 ORDER BY at ASC",
        )?;
        let rows = stmt.query_map(params![feature_id], row_to_status_event)?;
        rows.collect()
    })
    .await
}
