//! Plan/Step Engine (spec.md §4.7): TodoWrite sync, active-step selection,
//! and checkpoint drift detection, layered on `ijoka-graph`'s `steps`
//! module (which already implements `set_plan`'s atomic replace).

use crate::error::CoreError;
use crate::text::shares_no_tokens;
use ijoka_graph::GraphGateway;
use ijoka_types::{Step, StepStatus};
use uuid::Uuid;

pub async fn set_plan(
    gw: &GraphGateway,
    feature_id: Uuid,
    descriptions: Vec<String>,
) -> Result<Vec<Step>, CoreError> {
    Ok(ijoka_graph::nodes::steps::set_plan(gw, feature_id, descriptions).await?)
}

pub async fn get_plan(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Step>, CoreError> {
    Ok(ijoka_graph::nodes::steps::list_for_feature(gw, feature_id).await?)
}

/// One TodoWrite-reported todo item.
#[derive(Debug, Clone)]
pub struct TodoItem {
    pub content: String,
    pub status: StepStatus,
}

/// TodoWrite sync (spec.md §4.7): present+exists -> update status;
/// present+new -> create with `step_order = i`; absent -> mark `skipped`
/// (never deleted).
pub async fn sync_todos(
    gw: &GraphGateway,
    feature_id: Uuid,
    todos: Vec<TodoItem>,
) -> Result<Vec<Step>, CoreError> {
    let existing = get_plan(gw, feature_id).await?;

    let mut seen_descriptions = std::collections::HashSet::new();
    for (i, todo) in todos.iter().enumerate() {
        seen_descriptions.insert(todo.content.clone());
        match existing.iter().find(|s| s.description == todo.content) {
            Some(step) => {
                if step.status != todo.status {
                    let mut updated = step.clone();
                    apply_status(&mut updated, todo.status);
                    ijoka_graph::nodes::steps::save(gw, updated).await?;
                }
            }
            None => {
                let mut new_step = Step::new(todo.content.clone(), i as u32);
                apply_status(&mut new_step, todo.status);
                ijoka_graph::nodes::steps::save(gw, new_step.clone()).await?;
                ijoka_graph::edges::link(
                    gw,
                    ijoka_types::EdgeKind::BelongsTo,
                    new_step.id,
                    feature_id,
                    None,
                )
                .await?;
            }
        }
    }

    for step in &existing {
        if !seen_descriptions.contains(&step.description) && step.status != StepStatus::Skipped {
            let mut skipped = step.clone();
            skipped.status = StepStatus::Skipped;
            ijoka_graph::nodes::steps::save(gw, skipped).await?;
        }
    }

    get_plan(gw, feature_id).await
}

fn apply_status(step: &mut Step, new_status: StepStatus) {
    match new_status {
        StepStatus::InProgress if step.status != StepStatus::InProgress => step.start(chrono::Utc::now()),
        StepStatus::Completed if step.status != StepStatus::Completed => step.complete(chrono::Utc::now()),
        StepStatus::Skipped => step.skip(),
        _ => step.status = new_status,
    }
}

/// Active-step selection (spec.md §4.7): the single `in_progress` Step if
/// any, else the lowest-`step_order` `pending` Step.
pub fn active_step(steps: &[Step]) -> Option<&Step> {
    steps
        .iter()
        .find(|s| s.status == StepStatus::InProgress)
        .or_else(|| {
            steps
                .iter()
                .filter(|s| s.status == StepStatus::Pending)
                .min_by_key(|s| s.step_order)
        })
}

#[derive(Debug, Clone, Default)]
pub struct CheckpointWarnings(pub Vec<String>);

#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub feature_id: Uuid,
    pub active_step: Option<Step>,
    pub warnings: Vec<String>,
}

/// Checkpoint (spec.md §4.7): if `step_completed` substring-matches the
/// active Step's description, complete it and activate the next pending
/// Step; separately run a drift check against `current_activity`. Never
/// blocks -- warnings are informational only.
pub async fn checkpoint(
    gw: &GraphGateway,
    feature_id: Uuid,
    step_completed: Option<&str>,
    current_activity: Option<&str>,
) -> Result<CheckpointResult, CoreError> {
    let mut steps = get_plan(gw, feature_id).await?;
    let mut warnings = Vec::new();

    if let Some(completed_text) = step_completed {
        if let Some(active) = active_step(&steps).cloned() {
            if active
                .description
                .to_lowercase()
                .contains(&completed_text.to_lowercase())
                || completed_text.to_lowercase().contains(&active.description.to_lowercase())
            {
                let mut done = active.clone();
                done.complete(chrono::Utc::now());
                ijoka_graph::nodes::steps::save(gw, done).await?;

                if let Some(next) = steps
                    .iter()
                    .filter(|s| s.id != active.id && s.status == StepStatus::Pending)
                    .min_by_key(|s| s.step_order)
                    .cloned()
                {
                    let mut started = next;
                    started.start(chrono::Utc::now());
                    ijoka_graph::nodes::steps::save(gw, started).await?;
                }
                steps = get_plan(gw, feature_id).await?;
            }
        }
    }

    if let Some(activity) = current_activity {
        if let Some(active) = active_step(&steps) {
            if !activity.trim().is_empty()
                && !active.description.trim().is_empty()
                && shares_no_tokens(activity, &active.description)
            {
                warnings.push(format!(
                    "drift: current activity \"{activity}\" shares no tokens with active step \"{}\"",
                    active.description
                ));
            }
        }
    }

    Ok(CheckpointResult {
        feature_id,
        active_step: active_step(&steps).cloned(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::{Feature, FeatureCategory, WorkItemType};

    async fn make_feature(gw: &GraphGateway) -> Uuid {
        let project = ijoka_graph::nodes::projects::ensure(gw, "/repo", "repo").await.unwrap();
        let f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0);
        ijoka_graph::nodes::features::create(gw, f, project.id).await.unwrap().id
    }

    #[tokio::test]
    async fn sync_todos_creates_updates_and_skips() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = make_feature(&gw).await;
        set_plan(&gw, feature_id, vec!["Write parser".into(), "Write tests".into()])
            .await
            .unwrap();

        let todos = vec![TodoItem {
            content: "Write parser".into(),
            status: StepStatus::Completed,
        }];
        let steps = sync_todos(&gw, feature_id, todos).await.unwrap();
        let parser_step = steps.iter().find(|s| s.description == "Write parser").unwrap();
        assert_eq!(parser_step.status, StepStatus::Completed);
        let tests_step = steps.iter().find(|s| s.description == "Write tests").unwrap();
        assert_eq!(tests_step.status, StepStatus::Skipped);
    }

    #[tokio::test]
    async fn checkpoint_detects_drift_without_mutating_steps() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = make_feature(&gw).await;
        set_plan(&gw, feature_id, vec!["Write parser".into(), "Write tests".into()])
            .await
            .unwrap();
        let steps = get_plan(&gw, feature_id).await.unwrap();
        let mut first = steps[0].clone();
        first.start(chrono::Utc::now());
        ijoka_graph::nodes::steps::save(&gw, first).await.unwrap();

        let result = checkpoint(&gw, feature_id, None, Some("update UI colours"))
            .await
            .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("drift"));

        let steps_after = get_plan(&gw, feature_id).await.unwrap();
        assert_eq!(steps_after[0].status, StepStatus::InProgress);
    }

    #[tokio::test]
    async fn checkpoint_completes_active_step_and_activates_next() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let feature_id = make_feature(&gw).await;
        set_plan(&gw, feature_id, vec!["Write parser".into(), "Write tests".into()])
            .await
            .unwrap();
        let steps = get_plan(&gw, feature_id).await.unwrap();
        let mut first = steps[0].clone();
        first.start(chrono::Utc::now());
        ijoka_graph::nodes::steps::save(&gw, first).await.unwrap();

        let result = checkpoint(&gw, feature_id, Some("Write parser"), None).await.unwrap();
        let active = result.active_step.unwrap();
        assert_eq!(active.description, "Write tests");
        assert_eq!(active.status, StepStatus::InProgress);
    }
}
