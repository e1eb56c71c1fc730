use crate::edges;
use crate::{GraphError, GraphGateway};
use ijoka_types::{CompletionCriteria, EdgeKind, Feature, FeatureCategory, FeatureStatus, WorkItemType};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "id, description, category, kind, status, priority, steps, \
     file_patterns, branch_hint, work_count, assigned_agent, claiming_session_id, \
     claiming_agent, claimed_at, block_reason, parent_id, is_primary, is_session_work, \
     completion_criteria, created_at, updated_at, completed_at";

fn category_to_str(c: FeatureCategory) -> String {
    serde_json::to_value(c).unwrap().as_str().unwrap().to_string()
}
fn category_from_str(s: &str) -> FeatureCategory {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}
fn kind_to_str(k: WorkItemType) -> String {
    serde_json::to_value(k).unwrap().as_str().unwrap().to_string()
}
fn kind_from_str(s: &str) -> WorkItemType {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}
fn status_to_str(s: FeatureStatus) -> String {
    serde_json::to_value(s).unwrap().as_str().unwrap().to_string()
}
fn status_from_str(s: &str) -> FeatureStatus {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}

fn row_to_feature(row: &rusqlite::Row) -> rusqlite::Result<Feature> {
    let steps_json: String = row.get(6)?;
    let patterns_json: String = row.get(7)?;
    let criteria_json: Option<String> = row.get(18)?;
    Ok(Feature {
        id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
        description: row.get(1)?,
        category: category_from_str(&row.get::<_, String>(2)?),
        kind: kind_from_str(&row.get::<_, String>(3)?),
        status: status_from_str(&row.get::<_, String>(4)?),
        priority: row.get(5)?,
        steps: serde_json::from_str(&steps_json).unwrap_or_default(),
        file_patterns: serde_json::from_str(&patterns_json).unwrap_or_default(),
        branch_hint: row.get(8)?,
        work_count: row.get::<_, i64>(9)? as u64,
        assigned_agent: row.get(10)?,
        claiming_session_id: row
            .get::<_, Option<String>>(11)?
            .and_then(|s| s.parse().ok()),
        claiming_agent: row.get(12)?,
        claimed_at: row
            .get::<_, Option<String>>(13)?
            .and_then(|s| s.parse().ok()),
        block_reason: row.get(14)?,
        parent_id: row
            .get::<_, Option<String>>(15)?
            .and_then(|s| s.parse().ok()),
        is_primary: row.get::<_, i64>(16)? != 0,
        is_session_work: row.get::<_, i64>(17)? != 0,
        completion_criteria: criteria_json.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get::<_, String>(19)?.parse().unwrap(),
        updated_at: row.get::<_, String>(20)?.parse().unwrap(),
        completed_at: row
            .get::<_, Option<String>>(21)?
            .and_then(|s| s.parse().ok()),
    })
}

fn upsert(c: &rusqlite::Connection, f: &Feature) -> rusqlite::Result<()> {
    c.execute(
        "INSERT INTO features (id, description, category, kind, status, priority, steps, \
             file_patterns, branch_hint, work_count, assigned_agent, claiming_session_id, \
             claiming_agent, claimed_at, block_reason, parent_id, is_primary, is_session_work, \
             completion_criteria, created_at, updated_at, completed_at) \
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22) \
         ON CONFLICT(id) DO UPDATE SET \
             description=excluded.description, category=excluded.category, kind=excluded.kind, \
             status=excluded.status, priority=excluded.priority, steps=excluded.steps, \
             file_patterns=excluded.file_patterns, branch_hint=excluded.branch_hint, \
             work_count=excluded.work_count, assigned_agent=excluded.assigned_agent, \
             claiming_session_id=excluded.claiming_session_id, claiming_agent=excluded.claiming_agent, \
             claimed_at=excluded.claimed_at, block_reason=excluded.block_reason, \
             parent_id=excluded.parent_id, is_primary=excluded.is_primary, \
             is_session_work=excluded.is_session_work, completion_criteria=excluded.completion_criteria, \
             updated_at=excluded.updated_at, completed_at=excluded.completed_at",
        params![
            f.id.to_string(),
            f.description,
            category_to_str(f.category),
            kind_to_str(f.kind),
            status_to_str(f.status),
            f.priority,
            serde_json::to_string(&f.steps).unwrap(),
            serde_json::to_string(&f.file_patterns).unwrap(),
            f.branch_hint,
            f.work_count as i64,
            f.assigned_agent,
            f.claiming_session_id.map(|u| u.to_string()),
            f.claiming_agent,
            f.claimed_at.map(|t| t.to_rfc3339()),
            f.block_reason,
            f.parent_id.map(|u| u.to_string()),
            f.is_primary as i64,
            f.is_session_work as i64,
            f.completion_criteria
                .map(|cc| serde_json::to_string(&cc).unwrap()),
            f.created_at.to_rfc3339(),
            f.updated_at.to_rfc3339(),
            f.completed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub async fn save(gw: &GraphGateway, feature: Feature) -> Result<(), GraphError> {
    gw.write(move |c| upsert(c, &feature)).await
}

/// Creates the Feature and links `BELONGS_TO -> project`.
pub async fn create(
    gw: &GraphGateway,
    feature: Feature,
    project_id: Uuid,
) -> Result<Feature, GraphError> {
    save(gw, feature.clone()).await?;
    edges::link(gw, EdgeKind::BelongsTo, feature.id, project_id, None).await?;
    Ok(feature)
}

pub async fn get(gw: &GraphGateway, id: Uuid) -> Result<Option<Feature>, GraphError> {
    gw.read(move |c| {
        c.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM features WHERE id = ?1"),
            params![id.to_string()],
            row_to_feature,
        )
        .optional()
    })
    .await
}

pub async fn require(gw: &GraphGateway, id: Uuid) -> Result<Feature, GraphError> {
    get(gw, id)
        .await?
        .ok_or_else(|| GraphError::NotFound(format!("feature {id}")))
}

/// All Features belonging to a Project, optionally filtered by status.
pub async fn list_for_project(
    gw: &GraphGateway,
    project_id: Uuid,
    status: Option<FeatureStatus>,
) -> Result<Vec<Feature>, GraphError> {
    let project_id = project_id.to_string();
    gw.read(move |c| {
        let mut stmt = c.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM features f \
             JOIN edges e ON e.kind = 'BELONGS_TO' AND e.src_id = f.id \
             WHERE e.dst_id = ?1"
        ))?;
        let rows = stmt.query_map(params![project_id], row_to_feature)?;
        let mut out = Vec::new();
        for r in rows {
            let f = r?;
            if status.map(|s| s == f.status).unwrap_or(true) {
                out.push(f);
            }
        }
        Ok(out)
    })
    .await
}

pub async fn session_work_for_project(
    gw: &GraphGateway,
    project_id: Uuid,
) -> Result<Option<Feature>, GraphError> {
    let all = list_for_project(gw, project_id, None).await?;
    Ok(all.into_iter().find(|f| f.is_session_work))
}

pub async fn get_children(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Feature>, GraphError> {
    let ids = edges::sources(gw, EdgeKind::ChildOf, feature_id).await?;
    let mut out = Vec::new();
    for id in ids {
        if let Some(f) = get(gw, id).await? {
            out.push(f);
        }
    }
    Ok(out)
}

pub async fn get_ancestors(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Feature>, GraphError> {
    let ids = edges::ancestors(gw, feature_id).await?;
    let mut out = Vec::new();
    for id in ids {
        if let Some(f) = get(gw, id).await? {
            out.push(f);
        }
    }
    Ok(out)
}

pub async fn get_descendants(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Feature>, GraphError> {
    let mut out = Vec::new();
    let mut frontier = vec![feature_id];
    let mut seen = std::collections::HashSet::new();
    while let Some(current) = frontier.pop() {
        for child_id in edges::sources(gw, EdgeKind::ChildOf, current).await? {
            if seen.insert(child_id) {
                if let Some(f) = get(gw, child_id).await? {
                    frontier.push(child_id);
                    out.push(f);
                }
            }
        }
    }
    Ok(out)
}

pub async fn link_to_parent(
    gw: &GraphGateway,
    child: Uuid,
    parent: Uuid,
) -> Result<(), GraphError> {
    edges::link_child_to_parent(gw, child, parent).await
}

pub async fn unlink_from_parent(gw: &GraphGateway, child: Uuid) -> Result<(), GraphError> {
    edges::unlink_all_from(gw, EdgeKind::ChildOf, child).await
}

/// Hard-delete a Feature, its Steps, and every edge that references it --
/// as a child's parent (`BELONGS_TO`), as a child of another Feature
/// (`CHILD_OF` both ways), as either end of a `DEPENDS_ON`, and as the
/// target of Events' `LINKED_TO` -- so archival never leaves a dangling
/// row in the generic `edges` table (spec.md §3 lifecycle).
pub async fn archive(gw: &GraphGateway, feature_id: Uuid) -> Result<(), GraphError> {
    let step_ids = edges::sources(gw, EdgeKind::BelongsTo, feature_id).await?;
    let id_str = feature_id.to_string();
    gw.write(move |c| {
        c.execute("DELETE FROM features WHERE id = ?1", params![id_str])?;
        Ok(())
    })
    .await?;
    for step_id in step_ids {
        super::steps::delete(gw, step_id).await?;
    }
    edges::unlink_all_from(gw, EdgeKind::BelongsTo, feature_id).await?;
    edges::unlink_all_from(gw, EdgeKind::ChildOf, feature_id).await?;
    edges::unlink_all_to(gw, EdgeKind::ChildOf, feature_id).await?;
    edges::unlink_all_from(gw, EdgeKind::DependsOn, feature_id).await?;
    edges::unlink_all_to(gw, EdgeKind::DependsOn, feature_id).await?;
    edges::unlink_all_to(gw, EdgeKind::LinkedTo, feature_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::projects;

    async fn make_project(gw: &GraphGateway) -> Uuid {
        projects::ensure(gw, "/repo", "repo").await.unwrap().id
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project_id = make_project(&gw).await;
        let f = Feature::new_work_item("add login", FeatureCategory::Ui, WorkItemType::Feature, 5);
        let created = create(&gw, f.clone(), project_id).await.unwrap();
        let fetched = get(&gw, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.description, "add login");
    }

    #[tokio::test]
    async fn list_for_project_filters_by_status() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project_id = make_project(&gw).await;
        let mut f1 = Feature::new_work_item("a", FeatureCategory::Functional, WorkItemType::Bug, 0);
        f1.status = FeatureStatus::InProgress;
        create(&gw, f1, project_id).await.unwrap();
        let f2 = Feature::new_work_item("b", FeatureCategory::Functional, WorkItemType::Bug, 0);
        create(&gw, f2, project_id).await.unwrap();

        let in_progress = list_for_project(&gw, project_id, Some(FeatureStatus::InProgress))
            .await
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].description, "a");
    }

    #[tokio::test]
    async fn archive_removes_feature() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project_id = make_project(&gw).await;
        let f = Feature::new_work_item("x", FeatureCategory::Chore, WorkItemType::Chore, 0);
        let created = create(&gw, f, project_id).await.unwrap();
        archive(&gw, created.id).await.unwrap();
        assert!(get(&gw, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn archive_cleans_up_edges_referencing_the_feature() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project_id = make_project(&gw).await;
        let parent = create(
            &gw,
            Feature::new_work_item("parent", FeatureCategory::Functional, WorkItemType::Feature, 0),
            project_id,
        )
        .await
        .unwrap();
        let child = create(
            &gw,
            Feature::new_work_item("child", FeatureCategory::Functional, WorkItemType::Feature, 0),
            project_id,
        )
        .await
        .unwrap();
        let dependent = create(
            &gw,
            Feature::new_work_item("dependent", FeatureCategory::Functional, WorkItemType::Feature, 0),
            project_id,
        )
        .await
        .unwrap();
        link_to_parent(&gw, child.id, parent.id).await.unwrap();
        edges::link(
            &gw,
            EdgeKind::DependsOn,
            dependent.id,
            parent.id,
            Some(serde_json::json!(ijoka_types::DependsOnKind::Blocks)),
        )
        .await
        .unwrap();
        let event_pseudo = crate::nodes::events::pseudo_uuid("ev-1");
        edges::link(&gw, EdgeKind::LinkedTo, event_pseudo, parent.id, None)
            .await
            .unwrap();

        archive(&gw, parent.id).await.unwrap();

        assert!(edges::targets(&gw, EdgeKind::ChildOf, child.id).await.unwrap().is_empty());
        assert!(edges::targets_with_props(&gw, EdgeKind::DependsOn, dependent.id)
            .await
            .unwrap()
            .is_empty());
        assert!(edges::sources(&gw, EdgeKind::LinkedTo, parent.id).await.unwrap().is_empty());
        assert!(edges::sources(&gw, EdgeKind::BelongsTo, project_id)
            .await
            .unwrap()
            .iter()
            .all(|id| *id != parent.id));
    }
}
