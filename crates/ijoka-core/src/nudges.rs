//! Auto-Completion & Nudges (spec.md §4.8): completion-criteria evaluation
//! on PostToolUse, plus the three idempotent-per-Session nudge kinds.

use crate::claim_arbiter;
use crate::config::NudgesConfig;
use crate::error::CoreError;
use crate::text::contains_any;
use ijoka_graph::GraphGateway;
use ijoka_types::{CompletionCriteria, Event, EventType, Feature, Session};
use uuid::Uuid;

pub const COMMIT_REMINDER: &str = "commit_reminder";
pub const FEATURE_COMPLETION: &str = "feature_completion";
pub const DRIFT_WARNING: &str = "drift_warning";

const BUILD_KEYWORDS: &[&str] = &["build", "compile", "cargo build", "pnpm build", "npm run build"];
const TEST_KEYWORDS: &[&str] = &["test", "pytest", "jest", "vitest", "cargo test"];
const LINT_KEYWORDS: &[&str] = &["lint", "eslint", "prettier", "clippy"];

/// Evaluate a Feature's `completion_criteria` against a just-observed Bash
/// event (spec.md §4.8). Returns true if the criteria are met; callers
/// then mark the Feature complete and activate the next pending Feature.
/// Absence of `completion_criteria` is the "manual" Open Question
/// resolution (SPEC_FULL.md §E.2): never auto-completes.
pub fn criteria_met(feature: &Feature, command: Option<&str>, success: bool) -> bool {
    let Some(criteria) = feature.completion_criteria.as_ref() else {
        return false;
    };
    if feature.is_session_work {
        return false; // I7: Session-Work never auto-completes.
    }
    match criteria {
        CompletionCriteria::Build { command_pattern } => {
            success
                && command.is_some_and(|c| {
                    contains_any(c, BUILD_KEYWORDS) || command_pattern.as_deref().is_some_and(|p| matches_pattern(c, p))
                })
        }
        CompletionCriteria::Test => success && command.is_some_and(|c| contains_any(c, TEST_KEYWORDS)),
        CompletionCriteria::Lint => success && command.is_some_and(|c| contains_any(c, LINT_KEYWORDS)),
        CompletionCriteria::AnySuccess => success,
        CompletionCriteria::WorkCount { threshold } => feature.work_count >= *threshold,
    }
}

/// Matches `command` against a `command_pattern` regex, case-insensitive
/// (mirrors `original_source`'s `re.search(pattern, cmd, re.IGNORECASE)`).
/// An invalid pattern never matches rather than erroring, since this is an
/// author-supplied Feature field evaluated long after creation time.
fn matches_pattern(command: &str, pattern: &str) -> bool {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .is_ok_and(|re| re.is_match(command))
}

/// On match: mark the Feature complete and activate the next
/// non-in_progress, non-complete Feature in the Project (if any), by
/// highest priority.
pub async fn apply_auto_completion(
    gw: &GraphGateway,
    project_id: Uuid,
    feature: &Feature,
) -> Result<Option<Feature>, CoreError> {
    claim_arbiter::complete_feature(gw, feature.id, None).await?;
    let next = claim_arbiter::next_claimable_feature(gw, project_id).await?;
    if let Some(next_feature) = &next {
        claim_arbiter::start_feature(
            gw,
            next_feature.id,
            next_feature.assigned_agent.as_deref().unwrap_or("auto"),
            feature.claiming_session_id.unwrap_or(Uuid::nil()),
            true,
            claim_arbiter::DEFAULT_STALE_THRESHOLD_MINUTES,
        )
        .await
        .ok();
    }
    Ok(next)
}

/// Record a nudge as shown on the Session, idempotently. Returns `false`
/// if it had already fired (spec.md §4.8: "idempotent per Session").
pub async fn mark_nudge_shown(gw: &GraphGateway, session_id: Uuid, kind: &str) -> Result<bool, CoreError> {
    let mut session = ijoka_graph::nodes::sessions::get(gw, session_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("session {session_id}")))?;
    if session.nudges_shown.contains(kind) {
        return Ok(false);
    }
    session.nudges_shown.insert(kind.to_string());
    ijoka_graph::nodes::sessions::save(gw, session).await?;
    Ok(true)
}

/// `commit_reminder`: after >= `commit_reminder_edit_threshold` Edit/Write
/// events without a `git commit` Bash call in this Session.
pub fn commit_reminder_due(recent_events: &[Event], config: &NudgesConfig) -> bool {
    let mut edit_count = 0u32;
    for event in recent_events.iter().rev() {
        match event.tool_name.as_deref() {
            Some("Edit") | Some("Write") => edit_count += 1,
            Some("Bash") => {
                if let Some(cmd) = event.payload.get("command").and_then(|v| v.as_str()) {
                    if cmd.contains("git commit") {
                        return false;
                    }
                }
            }
            _ => {}
        }
    }
    edit_count >= config.commit_reminder_edit_threshold
}

/// `feature_completion`: a successful test/build Bash ran with an active
/// Feature present.
pub fn feature_completion_due(event: &Event, active_feature: Option<&Feature>) -> bool {
    if event.event_type != EventType::ToolCall || event.tool_name.as_deref() != Some("Bash") || !event.success {
        return false;
    }
    let Some(command) = event.payload.get("command").and_then(|v| v.as_str()) else {
        return false;
    };
    active_feature.is_some() && (contains_any(command, TEST_KEYWORDS) || contains_any(command, BUILD_KEYWORDS))
}

/// Fire whichever nudges are due, marking each idempotently; returns the
/// joined additional-context strings for the hook response.
pub async fn collect_nudges(
    gw: &GraphGateway,
    session: &Session,
    recent_events: &[Event],
    last_event: Option<&Event>,
    active_feature: Option<&Feature>,
    stuck: Option<(bool, &str)>,
    config: &NudgesConfig,
) -> Result<Vec<String>, CoreError> {
    let mut nudges = Vec::new();

    if commit_reminder_due(recent_events, config) && mark_nudge_shown(gw, session.id, COMMIT_REMINDER).await? {
        nudges.push("You've made several edits without committing -- consider a git commit.".to_string());
    }

    if let Some(event) = last_event {
        if feature_completion_due(event, active_feature)
            && mark_nudge_shown(gw, session.id, FEATURE_COMPLETION).await?
        {
            nudges.push("Tests/build passed -- check whether the active feature is complete.".to_string());
        }
    }

    if let Some((true, reason)) = stuck {
        if mark_nudge_shown(gw, session.id, DRIFT_WARNING).await? {
            nudges.push(format!("Possible stuckness detected: {reason}"));
        }
    }

    Ok(nudges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::{FeatureCategory, WorkItemType};

    fn feature_with_criteria(criteria: CompletionCriteria) -> Feature {
        let mut f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0);
        f.completion_criteria = Some(criteria);
        f
    }

    #[test]
    fn work_count_criteria_matches_at_threshold() {
        let mut f = feature_with_criteria(CompletionCriteria::WorkCount { threshold: 3 });
        f.work_count = 2;
        assert!(!criteria_met(&f, None, true));
        f.work_count = 3;
        assert!(criteria_met(&f, None, true));
    }

    #[test]
    fn build_criteria_requires_success_and_keyword() {
        let f = feature_with_criteria(CompletionCriteria::Build { command_pattern: None });
        assert!(criteria_met(&f, Some("cargo build --release"), true));
        assert!(!criteria_met(&f, Some("cargo build --release"), false));
        assert!(!criteria_met(&f, Some("cargo check"), true));
    }

    #[test]
    fn build_criteria_command_pattern_is_ored_with_keywords() {
        let f = feature_with_criteria(CompletionCriteria::Build {
            command_pattern: Some("cargo (build|check)".to_string()),
        });
        assert!(criteria_met(&f, Some("cargo check"), true));
        assert!(!criteria_met(&f, Some("cargo check"), false));
        assert!(!criteria_met(&f, Some("echo hi"), true));
    }

    #[test]
    fn session_work_never_auto_completes() {
        let mut f = feature_with_criteria(CompletionCriteria::AnySuccess);
        f.is_session_work = true;
        assert!(!criteria_met(&f, None, true));
    }

    #[test]
    fn manual_criteria_absence_never_completes() {
        let f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0);
        assert!(f.completion_criteria.is_none());
        assert!(!criteria_met(&f, Some("cargo test"), true));
    }
}
