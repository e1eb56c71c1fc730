//! Hook event ingestion (spec.md §6 "Inbound hook schema"): the single
//! pipeline both `ijoka-bridge` (over HTTP, if ever exposed that way) and
//! `ijoka-cli` (stdin/stdout) drive to turn a raw hook call into graph
//! mutations. This is where attribution, linking, work_count, auto-
//! transition, nudges, and stuckness detection are composed per event --
//! none of those modules call each other directly, by design, so each
//! stays independently testable.

use crate::attribution::{self, AttributionDecision};
use crate::claim_arbiter;
use crate::config::Config;
use crate::error::CoreError;
use crate::nudges;
use crate::stuckness;
use ijoka_graph::GraphGateway;
use ijoka_types::{Event, EventType, Project, Session};
use uuid::Uuid;

/// One `PostToolUse` (or `UserPromptSubmit`) call, already parsed from the
/// hook JSON (spec.md §6); transport-agnostic.
pub struct ToolCallContext<'a> {
    pub session_id: Uuid,
    pub cwd: &'a str,
    pub tool_name: Option<&'a str>,
    pub command: Option<&'a str>,
    pub file_path: Option<&'a str>,
    pub success: bool,
    pub user_prompt: Option<&'a str>,
}

pub struct ToolCallOutcome {
    pub attribution: AttributionDecision,
    pub nudges: Vec<String>,
}

/// `SessionStart`: ensures the Project exists and starts (or resumes) a
/// Session row.
pub async fn session_start(
    gw: &GraphGateway,
    session_id: Uuid,
    agent: &str,
    cwd: &str,
    is_subagent: bool,
    start_commit: Option<String>,
) -> Result<(Project, Session), CoreError> {
    let project_name = project_name_from_path(cwd);
    let project = crate::project_session::ensure_project(gw, cwd, &project_name).await?;
    let session =
        crate::project_session::start_session(gw, session_id, agent, project.id, is_subagent, start_commit).await?;
    Ok((project, session))
}

pub async fn session_end(gw: &GraphGateway, session_id: Uuid) -> Result<Session, CoreError> {
    crate::project_session::end_session(gw, session_id).await
}

/// `PostToolUse`: record the Event, attribute it, link + bump
/// `work_count`, check auto-completion and auto-transition, run the
/// Stuckness Detector, and collect any nudges due. Returns the attribution
/// decision plus the joined nudge strings for `hookSpecificOutput.additionalContext`.
pub async fn post_tool_use(
    gw: &GraphGateway,
    project: &Project,
    session: &Session,
    config: &Config,
    ctx: &ToolCallContext<'_>,
) -> Result<ToolCallOutcome, CoreError> {
    let tool_name = ctx.tool_name.unwrap_or("Unknown");
    let command_or_text = ctx.command.unwrap_or_default();

    ijoka_graph::nodes::sessions::update_activity(gw, session.id).await?;

    let event = Event {
        id: Event::deterministic_id(session.id, EventType::ToolCall, Some(tool_name)),
        event_type: EventType::ToolCall,
        tool_name: Some(tool_name.to_string()),
        payload: serde_json::json!({
            "command": ctx.command,
            "file_path": ctx.file_path,
        }),
        timestamp: chrono::Utc::now(),
        source_agent: session.agent.clone(),
        session_id: session.id,
        success: ctx.success,
        summary: format!("{tool_name} call"),
    };
    ijoka_graph::nodes::events::insert_if_absent(gw, event.clone()).await?;

    let decision = attribution::attribute_tool_call(
        gw,
        project.id,
        &project.name,
        session,
        tool_name,
        ctx.file_path,
        command_or_text,
        &config.attribution,
    )
    .await?;

    let mut active_feature = None;
    if let Some(feature_id) = decision.feature_id {
        let linked = ijoka_graph::nodes::events::link_to_feature(gw, &event.id, feature_id).await?;
        let mut feature = ijoka_graph::nodes::features::require(gw, feature_id).await?;
        if linked {
            feature.work_count += 1;
            ijoka_graph::nodes::features::save(gw, feature.clone()).await?;
            let transitioned = claim_arbiter::maybe_auto_transition(gw, &feature, &event.id).await?;
            if transitioned {
                feature = ijoka_graph::nodes::features::require(gw, feature_id).await?;
            }
        }

        if nudges::criteria_met(&feature, ctx.command, ctx.success) {
            nudges::apply_auto_completion(gw, project.id, &feature).await?;
            feature = ijoka_graph::nodes::features::require(gw, feature_id).await?;
        }
        active_feature = Some(feature);
    }

    let recent_events = ijoka_graph::nodes::events::recent_for_session(gw, session.id, 10).await?;
    let steps = if let Some(f) = &active_feature {
        ijoka_graph::nodes::steps::list_for_feature(gw, f.id).await?
    } else {
        Vec::new()
    };
    let active_step = crate::plan_step::active_step(&steps).cloned();
    let step_linked_events = if let Some(step) = &active_step {
        ijoka_graph::nodes::events::link_to_step(gw, &event.id, step.id).await?;
        ijoka_graph::nodes::events::linked_count_for_step(gw, step.id).await?
    } else {
        0
    };
    let stuckness = stuckness::detect(chrono::Utc::now(), &recent_events, active_step.as_ref(), step_linked_events);

    let nudge_texts = nudges::collect_nudges(
        gw,
        session,
        &recent_events,
        Some(&event),
        active_feature.as_ref(),
        Some((stuckness.stuck, stuckness.reason.as_str())),
        &config.nudges,
    )
    .await?;

    Ok(ToolCallOutcome {
        attribution: decision,
        nudges: nudge_texts,
    })
}

/// `UserPromptSubmit`: classify the prompt against all Features (layer e)
/// and cache the winner on the Session for the next `PostToolUse` call's
/// layer (c).
pub async fn user_prompt_submit(
    gw: &GraphGateway,
    project_id: Uuid,
    mut session: Session,
    prompt: &str,
    config: &Config,
) -> Result<Session, CoreError> {
    let all_features = ijoka_graph::nodes::features::list_for_project(gw, project_id, None).await?;
    let decision = attribution::classify_user_prompt(
        prompt,
        &all_features,
        config.attribution.prompt_confidence_threshold,
    );
    session.last_prompt = Some(prompt.to_string());
    if let Some(feature_id) = decision.feature_id {
        session.active_feature_id = Some(feature_id);
        session.classified_at = Some(chrono::Utc::now());
        session.classification_source = Some("user_prompt".to_string());
    }
    ijoka_graph::nodes::sessions::save(gw, session.clone()).await?;
    Ok(session)
}

/// `Stop` / `SubagentStop`: record the stop Event and run one last
/// stuckness/nudge pass, since a turn boundary is the natural point to
/// surface something like "you've been idle on this feature a while".
/// `is_subagent` selects `EventType::SubagentStop` over `AgentStop`.
pub async fn stop(
    gw: &GraphGateway,
    session: &Session,
    config: &Config,
    is_subagent: bool,
) -> Result<Vec<String>, CoreError> {
    let event_type = if is_subagent {
        EventType::SubagentStop
    } else {
        EventType::AgentStop
    };
    ijoka_graph::nodes::sessions::update_activity(gw, session.id).await?;

    let event = Event {
        id: Event::deterministic_id(session.id, event_type, None),
        event_type,
        tool_name: None,
        payload: serde_json::json!({}),
        timestamp: chrono::Utc::now(),
        source_agent: session.agent.clone(),
        session_id: session.id,
        success: true,
        summary: format!("{event_type:?} for session {}", session.id),
    };
    ijoka_graph::nodes::events::insert_if_absent(gw, event.clone()).await?;

    let active_feature = match session.active_feature_id {
        Some(id) => ijoka_graph::nodes::features::get(gw, id).await?,
        None => None,
    };
    let recent_events = ijoka_graph::nodes::events::recent_for_session(gw, session.id, 10).await?;
    let steps = if let Some(f) = &active_feature {
        ijoka_graph::nodes::steps::list_for_feature(gw, f.id).await?
    } else {
        Vec::new()
    };
    let active_step = crate::plan_step::active_step(&steps).cloned();
    let step_linked_events = match &active_step {
        Some(step) => ijoka_graph::nodes::events::linked_count_for_step(gw, step.id).await?,
        None => 0,
    };
    let stuckness = stuckness::detect(chrono::Utc::now(), &recent_events, active_step.as_ref(), step_linked_events);

    nudges::collect_nudges(
        gw,
        session,
        &recent_events,
        Some(&event),
        active_feature.as_ref(),
        Some((stuckness.stuck, stuckness.reason.as_str())),
        &config.nudges,
    )
    .await
}

fn project_name_from_path(cwd: &str) -> String {
    std::path::Path::new(cwd)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(cwd)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ijoka_types::{EventType, FeatureStatus};

    #[tokio::test]
    async fn post_tool_use_falls_back_to_session_work_when_no_feature_exists() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let config = Config::default();
        let session_id = Uuid::new_v4();

        let (project, session) = session_start(&gw, session_id, "claude", "/p", false, None)
            .await
            .unwrap();

        let ctx = ToolCallContext {
            session_id,
            cwd: "/p",
            tool_name: Some("Edit"),
            command: None,
            file_path: Some("/p/README.md"),
            success: true,
            user_prompt: None,
        };
        let outcome = post_tool_use(&gw, &project, &session, &config, &ctx).await.unwrap();

        let sw = ijoka_graph::nodes::features::session_work_for_project(&gw, project.id)
            .await
            .unwrap()
            .expect("session-work feature created");
        assert_eq!(outcome.attribution.feature_id, Some(sw.id));
        assert_eq!(sw.work_count, 1);
        assert_eq!(sw.status, FeatureStatus::Pending);

        let event_id = Event::deterministic_id(session_id, EventType::ToolCall, Some("Edit"));
        let linked = ijoka_graph::nodes::events::linked_feature_ids(&gw, &event_id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0], sw.id);
    }
}
