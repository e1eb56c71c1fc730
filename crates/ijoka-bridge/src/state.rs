//! Shared application state for all HTTP handlers, same shape as the
//! teacher's `at-bridge::http_api::state::ApiState` -- a single `Arc`-wrapped
//! struct handed to every route via axum's `State` extractor.

use ijoka_core::Config;
use ijoka_graph::GraphGateway;
use ijoka_types::Project;

/// One `ijoka-bridge` process serves exactly one Project (it is started
/// from within a project's working directory, same as the original hook
/// scripts were invoked per-repo); every route below is implicitly scoped
/// to `project.id`.
pub struct ApiState {
    pub gw: GraphGateway,
    pub config: Config,
    pub project: Project,
}

impl ApiState {
    pub fn new(gw: GraphGateway, config: Config, project: Project) -> Self {
        Self { gw, config, project }
    }
}
