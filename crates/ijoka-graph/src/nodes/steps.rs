use crate::edges;
use crate::{GraphError, GraphGateway};
use ijoka_types::{EdgeKind, Step, StepStatus};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, description, status, step_order, expected_tools, created_at, started_at, completed_at";

fn status_to_str(s: StepStatus) -> &'static str {
    match s {
        StepStatus::Pending => "pending",
        StepStatus::InProgress => "in_progress",
        StepStatus::Completed => "completed",
        StepStatus::Skipped => "skipped",
    }
}
fn status_from_str(s: &str) -> StepStatus {
    match s {
        "in_progress" => StepStatus::InProgress,
        "completed" => StepStatus::Completed,
        "skipped" => StepStatus::Skipped,
        _ => StepStatus::Pending,
    }
}

fn row_to_step(row: &rusqlite::Row) -> rusqlite::Result<Step> {
    let tools_json: String = row.get(4)?;
    Ok(Step {
        id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
        description: row.get(1)?,
        status: status_from_str(&row.get::<_, String>(2)?),
        step_order: row.get::<_, i64>(3)? as u32,
        expected_tools: serde_json::from_str(&tools_json).unwrap_or_default(),
        created_at: row.get::<_, String>(5)?.parse().unwrap(),
        started_at: row
            .get::<_, Option<String>>(6)?
            .and_then(|s| s.parse().ok()),
        completed_at: row
            .get::<_, Option<String>>(7)?
            .and_then(|s| s.parse().ok()),
    })
}

fn upsert(c: &rusqlite::Connection, s: &Step) -> rusqlite::Result<()> {
    c.execute(
        "INSERT INTO steps (id, description, status, step_order, expected_tools, created_at, \
             started_at, completed_at) VALUES (?1,?2,?3,?4,?5,?6,?7,?8) \
         ON CONFLICT(id) DO UPDATE SET \
             description=excluded.description, status=excluded.status, \
             step_order=excluded.step_order, expected_tools=excluded.expected_tools, \
             started_at=excluded.started_at, completed_at=excluded.completed_at",
        params![
            s.id.to_string(),
            s.description,
            status_to_str(s.status),
            s.step_order,
            serde_json::to_string(&s.expected_tools).unwrap(),
            s.created_at.to_rfc3339(),
            s.started_at.map(|t| t.to_rfc3339()),
            s.completed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub async fn save(gw: &GraphGateway, step: Step) -> Result<(), GraphError> {
    gw.write(move |c| upsert(c, &step)).await
}

pub async fn get(gw: &GraphGateway, id: Uuid) -> Result<Option<Step>, GraphError> {
    gw.read(move |c| {
        c.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM steps WHERE id = ?1"),
            params![id.to_string()],
            row_to_step,
        )
        .optional()
    })
    .await
}

pub async fn delete(gw: &GraphGateway, id: Uuid) -> Result<(), GraphError> {
    let id_str = id.to_string();
    gw.write(move |c| c.execute("DELETE FROM steps WHERE id = ?1", params![id_str]))
        .await?;
    edges::unlink_all_from(gw, EdgeKind::BelongsTo, id).await
}

/// Every Step belonging to a Feature, ordered by `step_order`.
pub async fn list_for_feature(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Step>, GraphError> {
    let ids = edges::sources(gw, EdgeKind::BelongsTo, feature_id).await?;
    let mut steps = Vec::new();
    for id in ids {
        if let Some(s) = get(gw, id).await? {
            steps.push(s);
        }
    }
    steps.sort_by_key(|s| s.step_order);
    Ok(steps)
}

/// `set_plan` (spec.md §4.7): atomically DETACH DELETE the Feature's
/// existing Steps, then CREATE the new ordered list.
pub async fn set_plan(
    gw: &GraphGateway,
    feature_id: Uuid,
    descriptions: Vec<String>,
) -> Result<Vec<Step>, GraphError> {
    for existing in list_for_feature(gw, feature_id).await? {
        delete(gw, existing.id).await?;
    }
    let mut created = Vec::new();
    for (i, desc) in descriptions.into_iter().enumerate() {
        let step = Step::new(desc, i as u32);
        save(gw, step.clone()).await?;
        edges::link(gw, EdgeKind::BelongsTo, step.id, feature_id, None).await?;
        created.push(step);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{features, projects};
    use ijoka_types::{Feature, FeatureCategory, WorkItemType};

    async fn make_feature(gw: &GraphGateway) -> Uuid {
        let project = projects::ensure(gw, "/repo", "repo").await.unwrap();
        let f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0);
        features::create(gw, f, project.id).await.unwrap().id
    }

    #[tokio::test]
    async fn set_plan_then_list_returns_ordered_steps() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = make_feature(&gw).await;
        set_plan(
            &gw,
            feature_id,
            vec!["Write parser".into(), "Write tests".into()],
        )
        .await
        .unwrap();
        let steps = list_for_feature(&gw, feature_id).await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].step_order, 0);
        assert_eq!(steps[1].step_order, 1);
        assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
    }

    #[tokio::test]
    async fn set_plan_replaces_previous_steps() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = make_feature(&gw).await;
        set_plan(&gw, feature_id, vec!["old".into()]).await.unwrap();
        set_plan(&gw, feature_id, vec!["new-a".into(), "new-b".into()])
            .await
            .unwrap();
        let steps = list_for_feature(&gw, feature_id).await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].description, "new-a");
    }
}
