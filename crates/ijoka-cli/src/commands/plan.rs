//! `plan` subcommands -- CLI counterpart of the bare `/plan` routes and
//! `features plan`'s feature-scoped equivalent.

use crate::context::CliContext;
use crate::output;
use ijoka_types::{Feature, FeatureStatus, Step, StepStatus};
use uuid::Uuid;

/// The Project's currently-claimed, non-Session-Work Feature -- same
/// definition `status` uses for `current_feature` (SPEC_FULL.md §E.7).
async fn current_feature(ctx: &CliContext) -> anyhow::Result<Feature> {
    let features = ijoka_core::feature_store::list(&ctx.gw, ctx.project.id, None).await?;
    features
        .into_iter()
        .filter(|f| !f.is_session_work && f.status == FeatureStatus::InProgress)
        .max_by_key(|f| f.claimed_at)
        .ok_or_else(|| anyhow::anyhow!("no feature currently in progress"))
}

pub async fn current_plan(ctx: &CliContext, json: bool) -> anyhow::Result<()> {
    let feature = current_feature(ctx).await?;
    print_plan(ctx, feature.id, json).await
}

pub async fn set_current_plan(
    ctx: &CliContext,
    steps: Vec<String>,
    feature_id: Option<Uuid>,
    json: bool,
) -> anyhow::Result<()> {
    let feature_id = match feature_id {
        Some(id) => id,
        None => current_feature(ctx).await?.id,
    };
    ijoka_core::plan_step::set_plan(&ctx.gw, feature_id, steps).await?;
    print_plan(ctx, feature_id, json).await
}

pub async fn feature_plan(ctx: &CliContext, id: Uuid, set: Option<Vec<String>>, json: bool) -> anyhow::Result<()> {
    if let Some(steps) = set {
        ijoka_core::plan_step::set_plan(&ctx.gw, id, steps).await?;
    }
    print_plan(ctx, id, json).await
}

async fn print_plan(ctx: &CliContext, feature_id: Uuid, json: bool) -> anyhow::Result<()> {
    let steps = ijoka_core::plan_step::get_plan(&ctx.gw, feature_id).await?;
    let active_step = ijoka_core::plan_step::active_step(&steps).cloned();
    let progress = progress(&steps);

    output::emit(
        &serde_json::json!({
            "feature_id": feature_id,
            "steps": &steps,
            "active_step": &active_step,
            "progress": &progress,
        }),
        json,
        |_| {
            for s in &steps {
                let marker = if s.status == StepStatus::Completed { "x" } else { " " };
                println!("[{marker}] {}. {}", s.step_order, s.description);
            }
            println!(
                "{}/{} steps complete ({:.0}%)",
                progress.completed, progress.total, progress.percentage
            );
        },
    )
}

fn progress(steps: &[Step]) -> Progress {
    let total = steps.len();
    let completed = steps.iter().filter(|s| s.status == StepStatus::Completed).count();
    let percentage = if total == 0 { 0.0 } else { (completed as f64 / total as f64) * 100.0 };
    Progress { completed, total, percentage }
}

#[derive(serde::Serialize)]
struct Progress {
    completed: usize,
    total: usize,
    percentage: f64,
}
