mod commands;
mod context;
mod output;
mod parse;

use clap::{Parser, Subcommand};
use context::CliContext;
use ijoka_core::CoreError;
use uuid::Uuid;

/// Ijoka CLI -- the thin adapter counterpart of the HTTP API (spec.md §4.12,
/// §6): one subcommand per route, plus the hook stdin/stdout protocol.
#[derive(Parser)]
#[command(name = "ijoka", version, about)]
struct Cli {
    /// Emit JSON instead of human-readable text.
    #[arg(short = 'j', long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show project status (spec.md `GET /status`).
    Status,

    /// Feature Store operations.
    Features {
        #[command(subcommand)]
        command: FeatureCommands,
    },

    /// Show or set the plan for the project's current feature.
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },

    /// Record progress against the current or a named feature.
    Checkpoint {
        #[arg(long)]
        feature_id: Option<Uuid>,
        #[arg(long)]
        step_completed: Option<String>,
        #[arg(long)]
        current_activity: Option<String>,
    },

    /// Insight CRUD and feedback.
    Insights {
        #[command(subcommand)]
        command: InsightCommands,
    },

    /// Analytics Read-Views.
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommands,
    },

    /// Ingest one hook event: reads the inbound JSON schema on stdin,
    /// writes the `hookSpecificOutput` envelope on stdout (spec.md §6).
    /// Never fails loudly: a processing error logs and still emits `{}`.
    Hook,
}

#[derive(Subcommand)]
enum FeatureCommands {
    /// List features, optionally filtered.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Create a feature.
    Create {
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
        #[arg(long = "type", default_value = "feature")]
        kind: String,
        #[arg(long, default_value_t = 0)]
        priority: i32,
        #[arg(long, value_delimiter = ',')]
        steps: Option<Vec<String>>,
        #[arg(long)]
        branch_hint: Option<String>,
    },
    /// Show one feature by id.
    Get { id: Uuid },
    /// Update one feature's fields.
    Update {
        id: Uuid,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<i32>,
        #[arg(long)]
        branch_hint: Option<String>,
    },
    /// Delete a feature.
    Delete { id: Uuid },
    /// Claim and start a feature.
    Start {
        id: Uuid,
        #[arg(long)]
        agent: String,
        #[arg(long, default_value_t = false)]
        force_override: bool,
    },
    /// Claim and start the highest-priority pending feature.
    StartNext {
        #[arg(long)]
        agent: String,
        #[arg(long, default_value_t = false)]
        force_override: bool,
    },
    /// Mark a feature complete and activate the next pending one.
    Complete {
        id: Uuid,
        #[arg(long)]
        summary: Option<String>,
    },
    /// Block a feature with a reason, optionally linking a blocking feature.
    Block {
        id: Uuid,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        blocking_feature_id: Option<Uuid>,
    },
    /// Surface a Feature retroactively and re-attribute recent Session-Work.
    Discover {
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
        #[arg(long = "type", default_value = "feature")]
        kind: String,
        #[arg(long, default_value_t = 0)]
        priority: i32,
        #[arg(long, value_delimiter = ',')]
        steps: Option<Vec<String>>,
        #[arg(long, default_value_t = 60)]
        lookback_minutes: i64,
        #[arg(long, default_value_t = false)]
        mark_complete: bool,
        #[arg(long)]
        branch_hint: Option<String>,
    },
    /// Show or set the plan for one feature.
    Plan {
        id: Uuid,
        #[arg(long, value_delimiter = ',')]
        set: Option<Vec<String>>,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Show the current feature's plan.
    Get,
    /// Replace the current feature's plan.
    Set {
        #[arg(long, value_delimiter = ',')]
        steps: Vec<String>,
        #[arg(long)]
        feature_id: Option<Uuid>,
    },
}

#[derive(Subcommand)]
enum InsightCommands {
    /// List insights, optionally filtered.
    List {
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Record a new insight.
    Create {
        #[arg(long)]
        description: String,
        #[arg(long)]
        pattern_type: String,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        feature_id: Option<Uuid>,
    },
    /// Record feedback on an insight's usefulness.
    Feedback {
        #[arg(long)]
        insight_id: Uuid,
        #[arg(long)]
        helpful: bool,
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Subcommand)]
enum AnalyticsCommands {
    /// Clusters, frequent workflows, and bottlenecks.
    Patterns,
    /// Completions-per-day over a trailing window.
    Velocity {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
    /// One agent's completion history.
    Profile { agent: String },
    /// Route a free-text question to the matching analytics view.
    Query {
        #[arg(long)]
        question: String,
    },
    /// Ranked daily summary.
    Digest,
}

async fn dispatch(ctx: &CliContext, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Status => commands::status::run(ctx, json).await,
        Commands::Features { command } => match command {
            FeatureCommands::List { status, category } => {
                commands::features::list(ctx, status, category, json).await
            }
            FeatureCommands::Create {
                description,
                category,
                kind,
                priority,
                steps,
                branch_hint,
            } => {
                commands::features::create(
                    ctx,
                    commands::features::CreateArgs {
                        description,
                        category,
                        kind,
                        priority,
                        steps,
                        branch_hint,
                    },
                    json,
                )
                .await
            }
            FeatureCommands::Get { id } => commands::features::get(ctx, id, json).await,
            FeatureCommands::Update {
                id,
                description,
                category,
                priority,
                branch_hint,
            } => {
                commands::features::update(
                    ctx,
                    id,
                    commands::features::UpdateArgs {
                        description,
                        category,
                        priority,
                        branch_hint,
                    },
                    json,
                )
                .await
            }
            FeatureCommands::Delete { id } => commands::features::delete(ctx, id, json).await,
            FeatureCommands::Start {
                id,
                agent,
                force_override,
            } => commands::features::start(ctx, id, &agent, force_override, json).await,
            FeatureCommands::StartNext { agent, force_override } => {
                commands::features::start_next(ctx, &agent, force_override, json).await
            }
            FeatureCommands::Complete { id, summary } => {
                commands::features::complete(ctx, id, summary, json).await
            }
            FeatureCommands::Block {
                id,
                reason,
                blocking_feature_id,
            } => commands::features::block(ctx, id, reason, blocking_feature_id, json).await,
            FeatureCommands::Discover {
                description,
                category,
                kind,
                priority,
                steps,
                lookback_minutes,
                mark_complete,
                branch_hint,
            } => {
                commands::features::discover(
                    ctx,
                    commands::features::DiscoverArgs {
                        description,
                        category,
                        kind,
                        priority,
                        steps,
                        lookback_minutes,
                        mark_complete,
                        branch_hint,
                    },
                    json,
                )
                .await
            }
            FeatureCommands::Plan { id, set } => commands::plan::feature_plan(ctx, id, set, json).await,
        },
        Commands::Plan { command } => match command {
            PlanCommands::Get => commands::plan::current_plan(ctx, json).await,
            PlanCommands::Set { steps, feature_id } => {
                commands::plan::set_current_plan(ctx, steps, feature_id, json).await
            }
        },
        Commands::Checkpoint {
            feature_id,
            step_completed,
            current_activity,
        } => commands::checkpoint::run(ctx, feature_id, step_completed, current_activity, json).await,
        Commands::Insights { command } => match command {
            InsightCommands::List { query, tags, limit } => {
                commands::insights::list(ctx, query, tags, limit, json).await
            }
            InsightCommands::Create {
                description,
                pattern_type,
                tags,
                feature_id,
            } => commands::insights::create(ctx, description, pattern_type, tags, feature_id, json).await,
            InsightCommands::Feedback {
                insight_id,
                helpful,
                comment,
            } => commands::insights::feedback(ctx, insight_id, helpful, comment, json).await,
        },
        Commands::Analytics { command } => match command {
            AnalyticsCommands::Patterns => commands::analytics::patterns(ctx, json).await,
            AnalyticsCommands::Velocity { days } => commands::analytics::velocity(ctx, days, json).await,
            AnalyticsCommands::Profile { agent } => commands::analytics::profile(ctx, &agent, json).await,
            AnalyticsCommands::Query { question } => commands::analytics::query(ctx, question, json).await,
            AnalyticsCommands::Digest => commands::analytics::digest(ctx, json).await,
        },
        Commands::Hook => commands::hook::run(ctx).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ijoka_telemetry::logging::init_logging("ijoka-cli", "warn");
    let cli = Cli::parse();
    let json = cli.json;

    let ctx = match CliContext::load().await {
        Ok(ctx) => ctx,
        Err(e) => {
            if json {
                eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            } else {
                eprintln!("error: {e}");
            }
            std::process::exit(output::ExitCode::StoreError as i32);
        }
    };

    let result = dispatch(&ctx, cli.command, json).await;
    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            let exit = match e.downcast_ref::<CoreError>() {
                Some(core_err) => output::report_error(core_err, json),
                None => {
                    if json {
                        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
                    } else {
                        eprintln!("error: {e}");
                    }
                    output::ExitCode::UserError
                }
            };
            std::process::exit(exit as i32);
        }
    }
}
