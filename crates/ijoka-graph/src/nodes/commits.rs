use crate::edges;
use crate::{GraphError, GraphGateway};
use ijoka_types::{Commit, EdgeKind};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

fn row_to_commit(row: &rusqlite::Row) -> rusqlite::Result<Commit> {
    Ok(Commit {
        hash: row.get(0)?,
        message: row.get(1)?,
        author: row.get(2)?,
        timestamp: row.get::<_, String>(3)?.parse().unwrap(),
    })
}

pub async fn get(gw: &GraphGateway, hash: &str) -> Result<Option<Commit>, GraphError> {
    let hash = hash.to_string();
    gw.read(move |c| {
        c.query_row(
            "SELECT hash, message, author, timestamp FROM commits WHERE hash = ?1",
            params![hash],
            row_to_commit,
        )
        .optional()
    })
    .await
}

fn pseudo_uuid(hash: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, hash.as_bytes())
}

/// Record a Commit observed by a Session, linking `MADE_COMMITS`.
pub async fn record(
    gw: &GraphGateway,
    commit: Commit,
    session_id: Uuid,
) -> Result<(), GraphError> {
    if get(gw, &commit.hash).await?.is_none() {
        let c2 = commit.clone();
        gw.write(move |c| {
            c.execute(
                "INSERT OR IGNORE INTO commits (hash, message, author, timestamp) \
                 VALUES (?1,?2,?3,?4)",
                params![c2.hash, c2.message, c2.author, c2.timestamp.to_rfc3339()],
            )
        })
        .await?;
    }
    edges::link(gw, EdgeKind::MadeCommits, session_id, pseudo_uuid(&commit.hash), None).await
}

/// Link a previously-recorded Commit to the Feature it implements.
pub async fn link_to_feature(
    gw: &GraphGateway,
    hash: &str,
    feature_id: Uuid,
) -> Result<(), GraphError> {
    edges::link(gw, EdgeKind::ImplementedIn, pseudo_uuid(hash), feature_id, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_is_idempotent_on_hash() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let session_id = Uuid::new_v4();
        let commit = Commit {
            hash: "abc123".into(),
            message: "fix bug".into(),
            author: Some("claude".into()),
            timestamp: chrono::Utc::now(),
        };
        record(&gw, commit.clone(), session_id).await.unwrap();
        record(&gw, commit.clone(), session_id).await.unwrap();
        let found = get(&gw, "abc123").await.unwrap().unwrap();
        assert_eq!(found.message, "fix bug");
    }
}
