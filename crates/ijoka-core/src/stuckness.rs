//! Stuckness Detector (spec.md §4.9): OR-combined strong/weak signals over
//! recent Session events and the active Step's dwell time.

use chrono::{DateTime, Duration, Utc};
use ijoka_types::{Event, Step};

#[derive(Debug, Clone, PartialEq)]
pub struct StucknessResult {
    pub stuck: bool,
    pub reason: String,
}

/// `recent_events` must be ordered most-recent-first (as returned by
/// `ijoka_graph::nodes::events::recent_for_session`). `step_linked_events`
/// is the count of Events `PART_OF_STEP` the active Step (spec.md §3) --
/// ignored when `active_step` is `None`.
pub fn detect(
    now: DateTime<Utc>,
    recent_events: &[Event],
    active_step: Option<&Step>,
    step_linked_events: usize,
) -> StucknessResult {
    let mut strong_reasons = Vec::new();
    let mut weak_reasons = Vec::new();

    match minutes_since_last_edit(now, recent_events) {
        Some(minutes) if minutes > 5.0 => strong_reasons.push(format!("no Edit/Write for {minutes:.0} min")),
        Some(minutes) if minutes >= 3.0 => weak_reasons.push(format!("no Edit/Write for {minutes:.0} min")),
        _ => {}
    }

    let (repeats, distinct_prefixes) = tool_repetition(recent_events, 10);
    if repeats >= 4 && distinct_prefixes <= 2 {
        strong_reasons.push(format!("tool repeated {repeats} times with {distinct_prefixes} distinct payloads"));
    } else if repeats >= 3 && distinct_prefixes <= 3 {
        weak_reasons.push(format!("tool repeated {repeats} times with low payload variance"));
    }

    if let Some(step) = active_step {
        if let Some(started_at) = step.started_at {
            let dwell_minutes = (now - started_at).num_seconds() as f64 / 60.0;
            if dwell_minutes > 15.0 && step_linked_events < 5 {
                strong_reasons.push(format!("step active {dwell_minutes:.0} min with {step_linked_events} events"));
            } else if dwell_minutes > 10.0 && step_linked_events < 3 {
                weak_reasons.push(format!("step active {dwell_minutes:.0} min with {step_linked_events} events"));
            }
        }
    }

    let stuck = !strong_reasons.is_empty() || weak_reasons.len() >= 2;
    let mut reasons = strong_reasons;
    reasons.extend(weak_reasons);
    StucknessResult {
        stuck,
        reason: reasons.join("; "),
    }
}

fn minutes_since_last_edit(now: DateTime<Utc>, recent_events: &[Event]) -> Option<f64> {
    let last_edit = recent_events
        .iter()
        .find(|e| matches!(e.tool_name.as_deref(), Some("Edit") | Some("Write")))?;
    Some((now - last_edit.timestamp).num_seconds() as f64 / 60.0)
}

/// Returns `(max repeat count for any single tool name, distinct payload
/// prefixes seen for that tool)` over the last `window` events.
fn tool_repetition(recent_events: &[Event], window: usize) -> (u32, u32) {
    use std::collections::HashMap;
    let mut counts: HashMap<&str, Vec<String>> = HashMap::new();
    for event in recent_events.iter().take(window) {
        let Some(tool) = event.tool_name.as_deref() else {
            continue;
        };
        let prefix = event.payload.to_string().chars().take(40).collect::<String>();
        counts.entry(tool).or_default().push(prefix);
    }
    counts
        .values()
        .map(|prefixes| {
            let distinct: std::collections::HashSet<&String> = prefixes.iter().collect();
            (prefixes.len() as u32, distinct.len() as u32)
        })
        .max_by_key(|(count, _)| *count)
        .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::EventType;
    use uuid::Uuid;

    fn tool_event(tool: &str, minutes_ago: i64, payload: serde_json::Value) -> Event {
        Event {
            id: Uuid::new_v4().to_string(),
            event_type: EventType::ToolCall,
            tool_name: Some(tool.to_string()),
            payload,
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            source_agent: "claude".into(),
            session_id: Uuid::new_v4(),
            success: true,
            summary: "x".into(),
        }
    }

    #[test]
    fn strong_signal_on_long_edit_silence() {
        let events = vec![
            tool_event("Read", 1, serde_json::json!({})),
            tool_event("Edit", 6, serde_json::json!({"file_path": "a.rs"})),
        ];
        let result = detect(Utc::now(), &events, None, 0);
        assert!(result.stuck);
    }

    #[test]
    fn two_weak_signals_combine_to_stuck() {
        let events = vec![
            tool_event("Read", 4, serde_json::json!({"a": 1})),
            tool_event("Bash", 1, serde_json::json!({"cmd": "ls"})),
            tool_event("Bash", 1, serde_json::json!({"cmd": "ls"})),
            tool_event("Bash", 1, serde_json::json!({"cmd": "ls"})),
        ];
        let result = detect(Utc::now(), &events, None, 0);
        assert!(result.stuck);
    }

    #[test]
    fn no_signals_when_actively_editing() {
        let events = vec![tool_event("Edit", 0, serde_json::json!({"file_path": "a.rs"}))];
        let result = detect(Utc::now(), &events, None, 0);
        assert!(!result.stuck);
    }

    fn step(started_minutes_ago: i64) -> ijoka_types::Step {
        let mut s = ijoka_types::Step::new("do the thing", 0);
        s.start(Utc::now() - Duration::minutes(started_minutes_ago));
        s
    }

    #[test]
    fn long_dwell_with_few_linked_events_is_strong() {
        let events = vec![tool_event("Edit", 0, serde_json::json!({}))];
        let s = step(16);
        let result = detect(Utc::now(), &events, Some(&s), 2);
        assert!(result.stuck);
    }

    #[test]
    fn long_dwell_with_many_linked_events_is_not_stuck() {
        let events = vec![tool_event("Edit", 0, serde_json::json!({}))];
        let s = step(16);
        let result = detect(Utc::now(), &events, Some(&s), 5);
        assert!(!result.stuck);
    }
}
