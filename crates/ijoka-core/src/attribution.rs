//! Attribution Engine (spec.md §4.6) -- the most critical component.
//! Decides which Feature(s), if any, an incoming Event should be linked
//! to, in classification-layer order: meta detection, diagnostic
//! detection, session cache, scored matching, UserPromptSubmit path,
//! Session-Work fallback.

use crate::config::AttributionConfig;
use crate::error::CoreError;
use crate::text::{file_pattern_matches, tokenize, word_overlap_ratio};
use ijoka_graph::GraphGateway;
use ijoka_types::{Feature, FeatureCategory, Session, WorkItemType};
use std::collections::BTreeSet;
use uuid::Uuid;

pub const SCORE_FILE_PATTERN: f64 = 0.4;
pub const SCORE_KEYWORD_WEIGHT: f64 = 0.3;
pub const SCORE_TYPE_WEIGHT: f64 = 0.2;
pub const SCORE_PRIMARY_BONUS: f64 = 0.1;

/// Why an event ended up linked (or not) to a Feature -- surfaced in logs
/// and analytics, never to the agent directly.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributionReason {
    Meta,
    Diagnostic,
    SessionCache,
    ScoredMatch { score: f64 },
    OnlyActive,
    BelowThreshold,
    UserPrompt { confidence: f64 },
    SessionWorkFallback,
    NoCandidate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributionDecision {
    pub feature_id: Option<Uuid>,
    pub reason: AttributionReason,
}

/// (a) Meta detection: tool name matches a configured Session-Work / MCP
/// meta-tool glob.
pub fn is_meta_tool(tool_name: &str, config: &AttributionConfig) -> bool {
    config
        .meta_tools
        .iter()
        .any(|pattern| file_pattern_matches(pattern, tool_name))
}

/// (b) Diagnostic detection: lightweight substring rules over the Bash
/// command (or other tool input) identifying read-only introspection of
/// Ijoka's own state. Never attributed to any Feature.
pub fn is_diagnostic_call(command_or_text: &str, config: &AttributionConfig) -> bool {
    let lower = command_or_text.to_lowercase();
    config
        .diagnostic_patterns
        .iter()
        .any(|p| lower.contains(&p.to_lowercase()))
}

/// (d) Scored matching: score one candidate Feature against an event's
/// extracted tokens and file path. Pure and deterministic.
pub fn score_feature(
    feature: &Feature,
    event_tokens: &BTreeSet<String>,
    file_path: Option<&str>,
) -> f64 {
    let mut score = 0.0;

    if let Some(path) = file_path {
        if feature
            .file_patterns
            .iter()
            .any(|pattern| file_pattern_matches(pattern, path))
        {
            score += SCORE_FILE_PATTERN;
        }
    }

    let feature_tokens = tokenize(&feature.description);
    if !feature_tokens.is_empty() {
        let overlap = event_tokens.intersection(&feature_tokens).count();
        score += SCORE_KEYWORD_WEIGHT * (overlap as f64 / feature_tokens.len().max(1) as f64);
    }

    score += SCORE_TYPE_WEIGHT * feature.kind.attribution_weight();

    if feature.is_primary {
        score += SCORE_PRIMARY_BONUS;
    }

    score
}

/// Pick the best-scoring candidate among `in_progress` Features (spec.md
/// §4.6(d)). Returns `None` with `BelowThreshold`/`NoCandidate` reasons
/// when nothing qualifies; `OnlyActive` short-circuits to score 1.0 when
/// there is exactly one candidate.
pub fn pick_scored_match(
    candidates: &[Feature],
    event_tokens: &BTreeSet<String>,
    file_path: Option<&str>,
    threshold: f64,
) -> AttributionDecision {
    if candidates.is_empty() {
        return AttributionDecision {
            feature_id: None,
            reason: AttributionReason::NoCandidate,
        };
    }
    if candidates.len() == 1 {
        return AttributionDecision {
            feature_id: Some(candidates[0].id),
            reason: AttributionReason::OnlyActive,
        };
    }

    let scored = candidates
        .iter()
        .map(|f| (f, score_feature(f, event_tokens, file_path)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    match scored {
        Some((feature, score)) if score >= threshold => AttributionDecision {
            feature_id: Some(feature.id),
            reason: AttributionReason::ScoredMatch { score },
        },
        _ => AttributionDecision {
            feature_id: None,
            reason: AttributionReason::BelowThreshold,
        },
    }
}

/// (e) UserPromptSubmit path: a lighter keyword-overlap classifier over
/// ALL Features (not just in_progress), boosted for not-yet-complete
/// (×1.3) and already-in_progress (×1.2).
pub fn classify_user_prompt(
    prompt: &str,
    all_features: &[Feature],
    confidence_threshold: f64,
) -> AttributionDecision {
    let scored = all_features
        .iter()
        .filter(|f| !f.is_session_work)
        .map(|f| {
            let mut confidence = word_overlap_ratio(prompt, &f.description);
            if f.status != ijoka_types::FeatureStatus::Complete {
                confidence *= 1.3;
            }
            if f.status == ijoka_types::FeatureStatus::InProgress {
                confidence *= 1.2;
            }
            (f, confidence)
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    match scored {
        Some((feature, confidence)) if confidence >= confidence_threshold => AttributionDecision {
            feature_id: Some(feature.id),
            reason: AttributionReason::UserPrompt { confidence },
        },
        _ => AttributionDecision {
            feature_id: None,
            reason: AttributionReason::NoCandidate,
        },
    }
}

/// (f) Session-Work fallback predicate: is this a known "work tool"?
pub fn is_work_tool(tool_name: &str, config: &AttributionConfig) -> bool {
    config.work_tools.iter().any(|t| t == tool_name)
}

/// Ensure the Project has a Session-Work sentinel Feature (creating it if
/// missing), per invariant I1.
pub async fn ensure_session_work_feature(
    gw: &GraphGateway,
    project_id: Uuid,
    project_name: &str,
) -> Result<Feature, CoreError> {
    if let Some(existing) = ijoka_graph::nodes::features::session_work_for_project(gw, project_id).await? {
        return Ok(existing);
    }
    let feature = Feature::new_session_work(project_name);
    Ok(ijoka_graph::nodes::features::create(gw, feature, project_id).await?)
}

/// Orchestrates layers (a)-(d)+(f) for a single `ToolCall` event. The
/// caller is responsible for the session-cache layer (c) and the
/// UserPromptSubmit path (e), which both mutate Session soft state and so
/// need access to the Session record; see `classify_user_prompt` above and
/// `attribute_tool_call`'s `session` parameter for (c).
pub async fn attribute_tool_call(
    gw: &GraphGateway,
    project_id: Uuid,
    project_name: &str,
    session: &Session,
    tool_name: &str,
    file_path: Option<&str>,
    command_or_text: &str,
    config: &AttributionConfig,
) -> Result<AttributionDecision, CoreError> {
    // (a) Meta detection.
    if is_meta_tool(tool_name, config) {
        let sw = ensure_session_work_feature(gw, project_id, project_name).await?;
        return Ok(AttributionDecision {
            feature_id: Some(sw.id),
            reason: AttributionReason::Meta,
        });
    }

    // (b) Diagnostic detection.
    if is_diagnostic_call(command_or_text, config) {
        return Ok(AttributionDecision {
            feature_id: None,
            reason: AttributionReason::Diagnostic,
        });
    }

    // (c) Session cache: a cached active_feature_id still in_progress wins.
    if let Some(cached_id) = session.active_feature_id {
        if let Some(cached) = ijoka_graph::nodes::features::get(gw, cached_id).await? {
            if cached.status == ijoka_types::FeatureStatus::InProgress {
                return Ok(AttributionDecision {
                    feature_id: Some(cached.id),
                    reason: AttributionReason::SessionCache,
                });
            }
        }
    }

    // (d) Scored matching over in_progress Features.
    let in_progress =
        ijoka_graph::nodes::features::list_for_project(gw, project_id, Some(ijoka_types::FeatureStatus::InProgress))
            .await?
            .into_iter()
            .filter(|f| !f.is_session_work)
            .collect::<Vec<_>>();
    let event_tokens = tokenize(&format!("{tool_name} {command_or_text}"));
    let decision = pick_scored_match(&in_progress, &event_tokens, file_path, config.score_threshold);
    if decision.feature_id.is_some() {
        return Ok(decision);
    }

    // (f) Session-Work fallback.
    if is_work_tool(tool_name, config) {
        let sw = ensure_session_work_feature(gw, project_id, project_name).await?;
        return Ok(AttributionDecision {
            feature_id: Some(sw.id),
            reason: AttributionReason::SessionWorkFallback,
        });
    }

    Ok(AttributionDecision {
        feature_id: None,
        reason: AttributionReason::NoCandidate,
    })
}

/// Category priority helper used nowhere in scoring directly but kept
/// alongside the type-priority weight for symmetry with analytics'
/// clustering, which groups by `FeatureCategory`.
pub fn category_label(category: FeatureCategory) -> &'static str {
    match category {
        FeatureCategory::Functional => "functional",
        FeatureCategory::Ui => "ui",
        FeatureCategory::Security => "security",
        FeatureCategory::Performance => "performance",
        FeatureCategory::Documentation => "documentation",
        FeatureCategory::Testing => "testing",
        FeatureCategory::Infrastructure => "infrastructure",
        FeatureCategory::Refactoring => "refactoring",
        FeatureCategory::Planning => "planning",
        FeatureCategory::Meta => "meta",
        FeatureCategory::Enhancement => "enhancement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::FeatureStatus;

    fn feature(desc: &str, kind: WorkItemType, patterns: &[&str]) -> Feature {
        let mut f = Feature::new_work_item(desc, FeatureCategory::Functional, kind, 0);
        f.status = FeatureStatus::InProgress;
        f.file_patterns = patterns.iter().map(|s| s.to_string()).collect();
        f
    }

    #[test]
    fn only_active_returns_score_one_equivalent_selection() {
        let f = feature("add login page", WorkItemType::Feature, &[]);
        let decision = pick_scored_match(&[f.clone()], &BTreeSet::new(), None, 0.15);
        assert_eq!(decision.feature_id, Some(f.id));
        assert_eq!(decision.reason, AttributionReason::OnlyActive);
    }

    #[test]
    fn file_pattern_match_dominates_score() {
        let a = feature("parser rewrite", WorkItemType::Chore, &["*.rs"]);
        let b = feature("docs pass", WorkItemType::Hotfix, &["*.md"]);
        let tokens = tokenize("edit file");
        let decision = pick_scored_match(&[a.clone(), b], &tokens, Some("src/main.rs"), 0.15);
        assert_eq!(decision.feature_id, Some(a.id));
    }

    #[test]
    fn below_threshold_rejects_all() {
        let a = feature("totally unrelated chore", WorkItemType::Chore, &[]);
        let b = feature("another unrelated epic", WorkItemType::Epic, &[]);
        let tokens = tokenize("zzz qqq");
        let decision = pick_scored_match(&[a, b], &tokens, None, 0.15);
        assert_eq!(decision.feature_id, None);
        assert_eq!(decision.reason, AttributionReason::BelowThreshold);
    }

    #[test]
    fn meta_tool_glob_matches_configured_pattern() {
        let config = AttributionConfig::default();
        assert!(is_meta_tool("mcp__ijoka__create_feature", &config));
        assert!(!is_meta_tool("Edit", &config));
    }

    #[test]
    fn user_prompt_boosts_in_progress_over_pending() {
        let mut pending = feature("write parser", WorkItemType::Feature, &[]);
        pending.status = FeatureStatus::Pending;
        let mut in_progress = feature("write parser tests", WorkItemType::Feature, &[]);
        in_progress.status = FeatureStatus::InProgress;
        let decision = classify_user_prompt("parser", &[pending, in_progress.clone()], 0.1);
        assert_eq!(decision.feature_id, Some(in_progress.id));
    }
}
