//! `features *` subcommands -- CLI counterparts of the `/features*` routes.

use crate::context::CliContext;
use crate::output;
use crate::parse;
use ijoka_types::Feature;
use uuid::Uuid;

pub struct CreateArgs {
    pub description: String,
    pub category: String,
    pub kind: String,
    pub priority: i32,
    pub steps: Option<Vec<String>>,
    pub branch_hint: Option<String>,
}

pub struct UpdateArgs {
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<i32>,
    pub branch_hint: Option<String>,
}

pub struct DiscoverArgs {
    pub description: String,
    pub category: String,
    pub kind: String,
    pub priority: i32,
    pub steps: Option<Vec<String>>,
    pub lookback_minutes: i64,
    pub mark_complete: bool,
    pub branch_hint: Option<String>,
}

pub async fn list(
    ctx: &CliContext,
    status_filter: Option<String>,
    category_filter: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let status = status_filter.as_deref().map(parse::status).transpose()?;
    let mut features = ijoka_core::feature_store::list(&ctx.gw, ctx.project.id, status).await?;
    if let Some(cat) = category_filter.as_deref().map(parse::category).transpose()? {
        features.retain(|f| f.category == cat);
    }
    let count = features.len();
    output::emit(&serde_json::json!({ "features": &features, "count": count }), json, |_| {
        for f in &features {
            println!("{}  [{}] {} ({})", f.id, f.status, f.description, f.category);
        }
        println!("{count} feature(s)");
    })
}

pub async fn create(ctx: &CliContext, args: CreateArgs, json: bool) -> anyhow::Result<()> {
    let category = parse::category(&args.category)?;
    let kind = parse::work_item_type(&args.kind)?;
    let mut feature = Feature::new_work_item(args.description, category, kind, args.priority);
    feature.branch_hint = args.branch_hint;
    let feature = ijoka_core::feature_store::create(&ctx.gw, feature, ctx.project.id).await?;
    if let Some(steps) = args.steps {
        ijoka_core::plan_step::set_plan(&ctx.gw, feature.id, steps).await?;
    }
    let feature = ijoka_core::feature_store::get(&ctx.gw, feature.id).await?;
    print_feature(&feature, json)
}

pub async fn get(ctx: &CliContext, id: Uuid, json: bool) -> anyhow::Result<()> {
    let feature = ijoka_core::feature_store::get(&ctx.gw, id).await?;
    print_feature(&feature, json)
}

pub async fn update(ctx: &CliContext, id: Uuid, args: UpdateArgs, json: bool) -> anyhow::Result<()> {
    let mut feature = ijoka_core::feature_store::get(&ctx.gw, id).await?;
    if let Some(d) = args.description {
        feature.description = d;
    }
    if let Some(c) = args.category.as_deref().map(parse::category).transpose()? {
        feature.category = c;
    }
    if let Some(p) = args.priority {
        feature.priority = p;
    }
    if args.branch_hint.is_some() {
        feature.branch_hint = args.branch_hint;
    }
    feature.updated_at = chrono::Utc::now();
    ijoka_core::feature_store::update(&ctx.gw, feature.clone()).await?;
    print_feature(&feature, json)
}

pub async fn delete(ctx: &CliContext, id: Uuid, json: bool) -> anyhow::Result<()> {
    ijoka_core::feature_store::delete(&ctx.gw, id).await?;
    output::emit(&serde_json::json!({ "ok": true }), json, |_| println!("deleted {id}"))
}

pub async fn start(ctx: &CliContext, id: Uuid, agent: &str, force_override: bool, json: bool) -> anyhow::Result<()> {
    let feature = ijoka_core::claim_arbiter::start_feature(
        &ctx.gw,
        id,
        agent,
        Uuid::new_v4(),
        force_override,
        ctx.config.general.stale_threshold_minutes,
    )
    .await?;
    print_feature(&feature, json)
}

pub async fn start_next(ctx: &CliContext, agent: &str, force_override: bool, json: bool) -> anyhow::Result<()> {
    let Some(next) = ijoka_core::claim_arbiter::next_claimable_feature(&ctx.gw, ctx.project.id).await? else {
        anyhow::bail!("no pending feature available");
    };
    start(ctx, next.id, agent, force_override, json).await
}

pub async fn complete(ctx: &CliContext, id: Uuid, summary: Option<String>, json: bool) -> anyhow::Result<()> {
    let feature = ijoka_core::claim_arbiter::complete_feature(&ctx.gw, id, None).await?;
    if let Some(summary) = summary {
        tracing::info!(feature_id = %id, %summary, "feature completed");
    }
    print_feature(&feature, json)
}

pub async fn block(
    ctx: &CliContext,
    id: Uuid,
    reason: String,
    blocking_feature_id: Option<Uuid>,
    json: bool,
) -> anyhow::Result<()> {
    let mut feature = ijoka_core::feature_store::get(&ctx.gw, id).await?;
    let from_status = feature.status;
    feature.block_reason = Some(reason.clone());
    ijoka_core::feature_store::update(&ctx.gw, feature.clone()).await?;

    if let Some(blocking_id) = blocking_feature_id {
        ijoka_graph::edges::link(
            &ctx.gw,
            ijoka_types::EdgeKind::DependsOn,
            id,
            blocking_id,
            Some(serde_json::json!(ijoka_types::DependsOnKind::Blocks)),
        )
        .await
        .map_err(ijoka_core::CoreError::from)?;
    }

    // `status_events::append` is the only writer of `Feature.status` (I3);
    // it materialises the transition onto the row itself.
    let status_event =
        ijoka_types::StatusEvent::new(from_status, ijoka_types::FeatureStatus::Blocked, reason, None);
    ijoka_graph::nodes::status_events::append(&ctx.gw, id, status_event)
        .await
        .map_err(ijoka_core::CoreError::from)?;

    feature.status = ijoka_types::FeatureStatus::Blocked;
    print_feature(&feature, json)
}

pub async fn discover(ctx: &CliContext, args: DiscoverArgs, json: bool) -> anyhow::Result<()> {
    let category = parse::category(&args.category)?;
    let kind = parse::work_item_type(&args.kind)?;
    let mut request = ijoka_core::discover::DiscoverRequest::new(args.description, category, kind);
    request.priority = args.priority;
    request.steps = args.steps;
    request.lookback_minutes = args.lookback_minutes;
    request.mark_complete = args.mark_complete;
    request.branch_hint = args.branch_hint;

    let result = ijoka_core::discover::discover_feature(
        &ctx.gw,
        ctx.project.id,
        &ctx.config.attribution.work_tools,
        request,
    )
    .await?;
    output::emit(
        &serde_json::json!({ "feature": &result.feature, "re_attributed_count": result.re_attributed_count }),
        json,
        |_| {
            println!(
                "discovered {} (re-attributed {} event(s))",
                result.feature.id, result.re_attributed_count
            );
        },
    )
}

fn print_feature(feature: &Feature, json: bool) -> anyhow::Result<()> {
    output::emit(&serde_json::json!({ "feature": feature }), json, |_| {
        println!("{}  [{}] {}", feature.id, feature.status, feature.description);
    })
}
