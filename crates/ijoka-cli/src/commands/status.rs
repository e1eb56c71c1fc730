//! `status` subcommand -- CLI counterpart of `GET /status`.

use crate::context::CliContext;
use crate::output;
use ijoka_types::FeatureStatus;
use serde_json::json;

pub async fn run(ctx: &CliContext, json_output: bool) -> anyhow::Result<()> {
    let features = ijoka_core::feature_store::list(&ctx.gw, ctx.project.id, None).await?;
    let current_feature = features
        .iter()
        .filter(|f| !f.is_session_work && f.status == FeatureStatus::InProgress)
        .max_by_key(|f| f.claimed_at);

    let total = features.len();
    let completed = features.iter().filter(|f| f.status == FeatureStatus::Complete).count();
    let value = json!({
        "project": ctx.project,
        "stats": { "total": total, "completed": completed },
        "current_feature": current_feature,
    });

    output::emit(&value, json_output, |v| {
        println!("project: {}", ctx.project.name);
        println!("features: {completed}/{total} complete");
        match &v["current_feature"] {
            serde_json::Value::Null => println!("current feature: none"),
            f => println!("current feature: {} ({})", f["description"], f["status"]),
        }
    })
}
