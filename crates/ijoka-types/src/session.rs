use super::enums::SessionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One agent run against a Project. Relations: `IN_PROJECT -> Project`,
/// `CONTINUED_FROM -> Session` (at most one predecessor per project).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub agent: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_count: u64,
    #[serde(default)]
    pub is_subagent: bool,
    #[serde(default)]
    pub start_commit: Option<String>,
    #[serde(default)]
    pub active_feature_id: Option<Uuid>,
    #[serde(default)]
    pub classified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub classification_source: Option<String>,
    #[serde(default)]
    pub last_prompt: Option<String>,
    /// Idempotency guard for nudges (spec.md §4.8): each nudge kind fires
    /// at most once per Session.
    #[serde(default)]
    pub nudges_shown: BTreeSet<String>,
}

impl Session {
    pub fn new(id: Uuid, agent: impl Into<String>, is_subagent: bool) -> Self {
        let now = Utc::now();
        Self {
            id,
            agent: agent.into(),
            status: SessionStatus::Active,
            started_at: now,
            last_activity: now,
            ended_at: None,
            event_count: 0,
            is_subagent,
            start_commit: None,
            active_feature_id: None,
            classified_at: None,
            classification_source: None,
            last_prompt: None,
            nudges_shown: BTreeSet::new(),
        }
    }

    /// Active if it has had any event within `stale_threshold` (default 30
    /// minutes per spec.md §4.5).
    pub fn is_active(&self, now: DateTime<Utc>, stale_threshold: chrono::Duration) -> bool {
        self.status == SessionStatus::Active && now - self.last_activity <= stale_threshold
    }

    pub fn record_event(&mut self, at: DateTime<Utc>) {
        self.last_activity = at;
        self.event_count += 1;
    }

    pub fn end(&mut self, at: DateTime<Utc>) {
        self.status = SessionStatus::Ended;
        self.ended_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_is_active_within_threshold() {
        let mut s = Session::new(Uuid::new_v4(), "claude", false);
        let now = s.started_at + chrono::Duration::minutes(10);
        assert!(s.is_active(now, chrono::Duration::minutes(30)));
        s.record_event(now);
        assert_eq!(s.event_count, 1);
    }

    #[test]
    fn session_is_stale_past_threshold() {
        let s = Session::new(Uuid::new_v4(), "claude", false);
        let later = s.started_at + chrono::Duration::hours(2);
        assert!(!s.is_active(later, chrono::Duration::minutes(30)));
    }

    #[test]
    fn ended_session_is_never_active() {
        let mut s = Session::new(Uuid::new_v4(), "claude", false);
        let now = s.started_at;
        s.end(now);
        assert!(!s.is_active(now, chrono::Duration::minutes(30)));
    }
}
