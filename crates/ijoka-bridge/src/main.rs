//! `ijoka-bridge`: starts the HTTP adapter for the Project rooted at the
//! current working directory.

use anyhow::{Context, Result};
use ijoka_bridge::{api_router, ApiState};
use ijoka_core::{project_session, Config};
use ijoka_graph::GraphGateway;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    ijoka_telemetry::logging::init_logging("ijoka-bridge", "info");

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

    info!(project = %project.name, bind_addr = %config.bridge.bind_addr, "starting ijoka-bridge");

    let bind_addr = config.bridge.bind_addr.clone();
    let state = Arc::new(ApiState::new(gw, config, project));
    let router = api_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    axum::serve(listener, router)
        .await
        .context("HTTP server exited")?;

    Ok(())
}
