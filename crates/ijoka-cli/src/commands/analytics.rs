//! `analytics *` subcommands -- CLI counterparts of `/analytics/*`, same
//! read-views `ijoka-bridge::handlers::analytics` calls into.

use crate::context::CliContext;
use crate::output;
use ijoka_analytics::{digest, patterns, profile, query, velocity};

pub async fn patterns(ctx: &CliContext, json: bool) -> anyhow::Result<()> {
    let clusters = patterns::detect_feature_clusters(&ctx.gw, ctx.project.id).await?;
    let workflows = patterns::find_common_workflows(&ctx.gw, ctx.project.id, 2).await?;
    let bottlenecks = patterns::detect_bottlenecks(&ctx.gw, ctx.project.id).await?;
    let (clusters_n, workflows_n, bottlenecks_n) = (clusters.len(), workflows.len(), bottlenecks.len());
    output::emit(
        &serde_json::json!({ "clusters": clusters, "workflows": workflows, "bottlenecks": bottlenecks }),
        json,
        |_| println!("{clusters_n} cluster(s), {workflows_n} workflow(s), {bottlenecks_n} bottleneck(s)"),
    )
}

pub async fn velocity(ctx: &CliContext, days: i64, json: bool) -> anyhow::Result<()> {
    let current = velocity::compute_velocity(&ctx.gw, ctx.project.id, days).await?;
    let drift_warnings = velocity::detect_velocity_drift(&ctx.gw, ctx.project.id).await?;
    let drift_count = drift_warnings.len();
    output::emit(
        &serde_json::json!({ "current": current, "drift_warnings": drift_warnings }),
        json,
        |_| println!("{drift_count} velocity drift warning(s)"),
    )
}

pub async fn profile(ctx: &CliContext, agent: &str, json: bool) -> anyhow::Result<()> {
    let p = profile::build_profile(&ctx.gw, ctx.project.id, agent).await?;
    output::emit(&serde_json::json!({ "profile": p }), json, |_| {
        println!("profile for {agent}");
    })
}

pub async fn query(ctx: &CliContext, question: String, json: bool) -> anyhow::Result<()> {
    let response = query::route(&ctx.gw, ctx.project.id, &question).await?;
    output::emit(&response, json, print_pretty)
}

pub async fn digest(ctx: &CliContext, json: bool) -> anyhow::Result<()> {
    let d = digest::generate(&ctx.gw, ctx.project.id, 10).await?;
    output::emit(&d, json, print_pretty)
}

fn print_pretty<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to render output: {e}"),
    }
}
