//! `checkpoint` subcommand -- CLI counterpart of `POST /checkpoint`.

use crate::context::CliContext;
use crate::output;
use ijoka_types::FeatureStatus;
use uuid::Uuid;

async fn current_feature_id(ctx: &CliContext) -> anyhow::Result<Uuid> {
    let features = ijoka_core::feature_store::list(&ctx.gw, ctx.project.id, None).await?;
    features
        .into_iter()
        .filter(|f| !f.is_session_work && f.status == FeatureStatus::InProgress)
        .max_by_key(|f| f.claimed_at)
        .map(|f| f.id)
        .ok_or_else(|| anyhow::anyhow!("no feature currently in progress"))
}

pub async fn run(
    ctx: &CliContext,
    feature_id: Option<Uuid>,
    step_completed: Option<String>,
    current_activity: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let feature_id = match feature_id {
        Some(id) => id,
        None => current_feature_id(ctx).await?,
    };
    let result = ijoka_core::plan_step::checkpoint(
        &ctx.gw,
        feature_id,
        step_completed.as_deref(),
        current_activity.as_deref(),
    )
    .await?;
    let feature = ijoka_core::feature_store::get(&ctx.gw, feature_id).await?;
    let steps = ijoka_core::plan_step::get_plan(&ctx.gw, feature_id).await?;
    let total = steps.len();
    let completed = steps
        .iter()
        .filter(|s| s.status == ijoka_types::StepStatus::Completed)
        .count();

    output::emit(
        &serde_json::json!({
            "feature": &feature,
            "active_step": &result.active_step,
            "progress": { "completed": completed, "total": total },
            "warnings": &result.warnings,
        }),
        json,
        |_| {
            println!("feature: {} [{}]", feature.description, feature.status);
            if let Some(step) = &result.active_step {
                println!("active step: {}", step.description);
            }
            for warning in &result.warnings {
                println!("warning: {warning}");
            }
        },
    )
}
