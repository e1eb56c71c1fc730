//! `insights *` subcommands -- CLI counterpart of `/insights` and
//! `/analytics/feedback`.

use crate::context::CliContext;
use crate::output;
use crate::parse;
use ijoka_types::Insight;
use uuid::Uuid;

pub async fn list(
    ctx: &CliContext,
    query: Option<String>,
    tags: Option<Vec<String>>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let tags = tags.unwrap_or_default();
    let insights = ijoka_core::insights::list(&ctx.gw, query, tags, limit).await?;
    let count = insights.len();
    output::emit(&serde_json::json!({ "insights": &insights, "count": count }), json, |_| {
        for i in &insights {
            println!("{}  {}", i.id, i.description);
        }
        println!("{count} insight(s)");
    })
}

pub async fn create(
    ctx: &CliContext,
    description: String,
    pattern_type: String,
    tags: Option<Vec<String>>,
    feature_id: Option<Uuid>,
    json: bool,
) -> anyhow::Result<()> {
    let pattern_type = parse::insight_pattern_type(&pattern_type)?;
    let mut insight = Insight::new(description, pattern_type);
    insight.tags = tags.unwrap_or_default().into_iter().collect();
    let insight = ijoka_core::insights::create(&ctx.gw, insight, feature_id).await?;
    output::emit(&serde_json::json!({ "insight": &insight }), json, |_| {
        println!("created {}", insight.id);
    })
}

pub async fn feedback(
    ctx: &CliContext,
    insight_id: Uuid,
    helpful: bool,
    comment: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let insight = ijoka_core::insights::record_feedback(&ctx.gw, insight_id, helpful).await?;
    if let Some(comment) = comment {
        tracing::info!(insight_id = %insight_id, %comment, "insight feedback comment");
    }
    output::emit(&serde_json::json!({ "insight": insight }), json, |_| {
        println!("recorded feedback for {insight_id}");
    })
}
