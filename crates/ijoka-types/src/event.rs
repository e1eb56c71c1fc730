use super::enums::EventType;
use super::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SUMMARY_MAX_LEN: usize = 200;

/// One hook invocation, as attributed (or not yet attributed) to Feature(s).
/// Relations: `TRIGGERED_BY -> Session`, `LINKED_TO -> Feature` (0..N),
/// `PART_OF_STEP -> Step` (0..1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: EventType,
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Opaque JSON, bounded to roughly 10 KB by the adapter before ingest.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub source_agent: String,
    pub session_id: Uuid,
    pub success: bool,
    pub summary: String,
}

impl Event {
    /// Derive a deterministic id so re-delivery of the same hook event is
    /// idempotent (invariant I9). `content_hash` is an optional extra
    /// disambiguator (e.g. a hash of tool_input) for event types that can
    /// repeat identically within the same session/type pair.
    pub fn deterministic_id(
        session_id: Uuid,
        event_type: EventType,
        content_hash: Option<&str>,
    ) -> String {
        use std::fmt::Write as _;
        let mut buf = String::new();
        let _ = write!(buf, "{session_id}:{event_type:?}");
        if let Some(h) = content_hash {
            let _ = write!(buf, ":{h}");
        }
        buf
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.summary.chars().count() > SUMMARY_MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "summary",
                max: SUMMARY_MAX_LEN,
                actual: self.summary.chars().count(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_id_is_stable_for_same_inputs() {
        let sid = Uuid::new_v4();
        let a = Event::deterministic_id(sid, EventType::ToolCall, Some("abc"));
        let b = Event::deterministic_id(sid, EventType::ToolCall, Some("abc"));
        assert_eq!(a, b);
    }

    #[test]
    fn deterministic_id_differs_by_event_type() {
        let sid = Uuid::new_v4();
        let a = Event::deterministic_id(sid, EventType::ToolCall, None);
        let b = Event::deterministic_id(sid, EventType::UserQuery, None);
        assert_ne!(a, b);
    }

    #[test]
    fn validate_rejects_overlong_summary() {
        let e = Event {
            id: "x".into(),
            event_type: EventType::ToolCall,
            tool_name: None,
            payload: serde_json::json!({}),
            timestamp: Utc::now(),
            source_agent: "claude".into(),
            session_id: Uuid::new_v4(),
            success: true,
            summary: "a".repeat(SUMMARY_MAX_LEN + 1),
        };
        assert!(matches!(
            e.validate(),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
