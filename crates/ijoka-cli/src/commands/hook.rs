//! Hook event ingestion (spec.md §6 "Inbound hook schema" / "Hook
//! response"): reads one JSON object from stdin, calls into
//! `ijoka_core::hooks`, writes the `hookSpecificOutput` envelope to
//! stdout. Per spec.md §7, a hook must never surface an error to the
//! calling agent -- any failure here logs and still emits `{}`.

use crate::context::CliContext;
use ijoka_types::{Project, Session};
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

const SOURCE_AGENT: &str = "claude-code";

#[derive(Debug, Deserialize)]
struct HookInput {
    hook_type: String,
    session_id: String,
    cwd: String,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_input: Option<serde_json::Value>,
    #[serde(default)]
    tool_response: Option<serde_json::Value>,
    #[serde(default)]
    user_prompt: Option<String>,
}

pub async fn run(ctx: &CliContext) -> anyhow::Result<()> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;

    match process(ctx, &raw).await {
        Ok((hook_event_name, nudges)) => {
            let additional_context = if nudges.is_empty() { None } else { Some(nudges.join(" ")) };
            println!(
                "{}",
                serde_json::json!({
                    "hookSpecificOutput": {
                        "hookEventName": hook_event_name,
                        "additionalContext": additional_context,
                    }
                })
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "hook processing failed, degrading to no-op");
            println!("{{}}");
        }
    }
    Ok(())
}

async fn process(ctx: &CliContext, raw: &str) -> anyhow::Result<(String, Vec<String>)> {
    let input: HookInput = serde_json::from_str(raw)?;
    let session_id = parse_session_id(&input.session_id);
    let hook_event_name = input.hook_type.clone();

    let tool_input = input.tool_input.as_ref();
    let command = tool_input.and_then(|v| v.get("command")).and_then(|v| v.as_str());
    let file_path = tool_input.and_then(|v| v.get("file_path")).and_then(|v| v.as_str());
    let success = input
        .tool_response
        .as_ref()
        .and_then(|v| v.get("is_error"))
        .and_then(|v| v.as_bool())
        .map(|is_error| !is_error)
        .unwrap_or(true);

    let nudges = match input.hook_type.as_str() {
        "SessionStart" => {
            ijoka_core::hooks::session_start(&ctx.gw, session_id, SOURCE_AGENT, &input.cwd, false, None).await?;
            Vec::new()
        }
        "SessionEnd" => {
            ijoka_core::hooks::session_end(&ctx.gw, session_id).await?;
            Vec::new()
        }
        "UserPromptSubmit" => {
            let project = project_for(ctx, &input.cwd).await?;
            let session = require_session(ctx, session_id).await?;
            let prompt = input.user_prompt.unwrap_or_default();
            ijoka_core::hooks::user_prompt_submit(&ctx.gw, project.id, session, &prompt, &ctx.config).await?;
            Vec::new()
        }
        "PostToolUse" => {
            let project = project_for(ctx, &input.cwd).await?;
            let session = require_session(ctx, session_id).await?;
            let call_ctx = ijoka_core::hooks::ToolCallContext {
                session_id,
                cwd: &input.cwd,
                tool_name: input.tool_name.as_deref(),
                command,
                file_path,
                success,
                user_prompt: None,
            };
            let outcome =
                ijoka_core::hooks::post_tool_use(&ctx.gw, &project, &session, &ctx.config, &call_ctx).await?;
            outcome.nudges
        }
        "Stop" => {
            let session = require_session(ctx, session_id).await?;
            ijoka_core::hooks::stop(&ctx.gw, &session, &ctx.config, false).await?
        }
        "SubagentStop" => {
            let session = require_session(ctx, session_id).await?;
            ijoka_core::hooks::stop(&ctx.gw, &session, &ctx.config, true).await?
        }
        other => anyhow::bail!("unknown hook_type: {other}"),
    };

    Ok((hook_event_name, nudges))
}

async fn require_session(ctx: &CliContext, session_id: Uuid) -> anyhow::Result<Session> {
    Ok(ijoka_core::project_session::get_session(&ctx.gw, session_id).await?)
}

/// Resolves the Project from the hook payload's own `cwd`, the same way
/// `ijoka_core::hooks::session_start` does -- never `ctx.project`, which is
/// only resolved once from the CLI process's own cwd at startup and can
/// diverge from the invoking agent's cwd for a given hook call (I8).
async fn project_for(ctx: &CliContext, cwd: &str) -> anyhow::Result<Project> {
    let project_name = std::path::Path::new(cwd)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(cwd)
        .to_string();
    Ok(ijoka_core::project_session::ensure_project(&ctx.gw, cwd, &project_name).await?)
}

/// Claude Code's own session ids are UUIDs; anything else is re-derived
/// deterministically so repeated calls with the same non-UUID id still
/// resolve to the same Session row.
fn parse_session_id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_core::Config;
    use ijoka_graph::GraphGateway;

    async fn test_ctx() -> CliContext {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ijoka_core::project_session::ensure_project(&gw, "/p", "p").await.unwrap();
        CliContext { gw, config: Config::default(), project }
    }

    #[tokio::test]
    async fn session_start_then_post_tool_use_round_trips() {
        let ctx = test_ctx().await;
        let session_id = Uuid::new_v4();

        let (name, nudges) = process(
            &ctx,
            &serde_json::json!({
                "hook_type": "SessionStart",
                "session_id": session_id.to_string(),
                "cwd": "/p",
            })
            .to_string(),
        )
        .await
        .unwrap();
        assert_eq!(name, "SessionStart");
        assert!(nudges.is_empty());

        let (name, _) = process(
            &ctx,
            &serde_json::json!({
                "hook_type": "PostToolUse",
                "session_id": session_id.to_string(),
                "cwd": "/p",
                "tool_name": "Edit",
                "tool_input": { "file_path": "/p/README.md" },
            })
            .to_string(),
        )
        .await
        .unwrap();
        assert_eq!(name, "PostToolUse");
    }

    #[tokio::test]
    async fn non_uuid_session_id_resolves_deterministically() {
        let a = parse_session_id("claude-session-abc");
        let b = parse_session_id("claude-session-abc");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn unknown_hook_type_is_an_error_not_a_panic() {
        let ctx = test_ctx().await;
        let result = process(
            &ctx,
            &serde_json::json!({
                "hook_type": "NotARealHook",
                "session_id": Uuid::new_v4().to_string(),
                "cwd": "/p",
            })
            .to_string(),
        )
        .await;
        assert!(result.is_err());
    }
}
