use crate::{GraphError, GraphGateway};
use chrono::Utc;
use ijoka_types::Project;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
        path: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get::<_, String>(4)?.parse().unwrap(),
        updated_at: row.get::<_, String>(5)?.parse().unwrap(),
    })
}

pub async fn get_by_path(gw: &GraphGateway, path: &str) -> Result<Option<Project>, GraphError> {
    let path = path.to_string();
    gw.read(move |c| {
        c.query_row(
            "SELECT id, path, name, description, created_at, updated_at \
             FROM projects WHERE path = ?1",
            params![path],
            row_to_project,
        )
        .optional()
    })
    .await
}

pub async fn get_by_id(gw: &GraphGateway, id: Uuid) -> Result<Option<Project>, GraphError> {
    gw.read(move |c| {
        c.query_row(
            "SELECT id, path, name, description, created_at, updated_at \
             FROM projects WHERE id = ?1",
            params![id.to_string()],
            row_to_project,
        )
        .optional()
    })
    .await
}

fn insert(gw_conn: &rusqlite::Connection, p: &Project) -> rusqlite::Result<()> {
    gw_conn.execute(
        "INSERT INTO projects (id, path, name, description, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            p.id.to_string(),
            p.path,
            p.name,
            p.description,
            p.created_at.to_rfc3339(),
            p.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Idempotent upsert keyed by `path` (spec.md §4.3 `ensure_project`).
pub async fn ensure(gw: &GraphGateway, path: &str, name: &str) -> Result<Project, GraphError> {
    if let Some(existing) = get_by_path(gw, path).await? {
        return Ok(existing);
    }
    let project = Project::new(path, name);
    let to_insert = project.clone();
    let result = gw.write(move |c| insert(c, &to_insert)).await;
    match result {
        Ok(()) => Ok(project),
        Err(GraphError::Internal(msg)) if msg.contains("UNIQUE constraint failed") => {
            // Lost a race with a concurrent ensure_project on the same path.
            get_by_path(gw, path)
                .await?
                .ok_or_else(|| GraphError::Internal(msg))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let a = ensure(&gw, "/repo", "repo").await.unwrap();
        let b = ensure(&gw, "/repo", "repo").await.unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn get_by_id_after_ensure() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let p = ensure(&gw, "/repo2", "repo2").await.unwrap();
        let found = get_by_id(&gw, p.id).await.unwrap().unwrap();
        assert_eq!(found.path, "/repo2");
    }
}
