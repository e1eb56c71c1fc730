//! Process-wide setup shared by every subcommand: load config, open the
//! graph store, resolve the Project for the current working directory.
//! Same shape as `ijoka-bridge::main`, since both adapters bootstrap the
//! same three things before doing anything else.

use anyhow::Context as _;
use ijoka_core::{project_session, Config};
use ijoka_graph::GraphGateway;
use ijoka_types::Project;
use std::time::Duration;

pub struct CliContext {
    pub gw: GraphGateway,
    pub config: Config,
    pub project: Project,
}

impl CliContext {
    pub async fn load() -> anyhow::Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Config::default()
        });

        let db_path = std::path::Path::new(&config.graph.path);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let gw = GraphGateway::open(
            db_path,
            config.graph.pool_size,
            Duration::from_secs(config.graph.acquire_timeout_seconds),
        )
        .await
        .with_context(|| format!("failed to open graph store at {}", db_path.display()))?;

        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let project_name = cwd
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        let project = project_session::ensure_project(&gw, &cwd.to_string_lossy(), &project_name).await?;

        Ok(Self { gw, config, project })
    }
}
