//! String -> domain enum parsing for CLI flags. Reuses the serde
//! round-trip idiom already used at the graph layer (`ijoka-graph::nodes::
//! features`) and the HTTP adapter (`ijoka-bridge::handlers::features`)
//! for the same purpose: CLI flags are untrusted input just like query
//! strings, so parse errors become a user-visible `anyhow::bail!` here
//! rather than a panic.

use ijoka_types::{FeatureCategory, FeatureStatus, InsightPatternType, WorkItemType};

fn from_str<T: serde::de::DeserializeOwned>(kind: &str, s: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| anyhow::anyhow!("unknown {kind}: {s}"))
}

pub fn category(s: &str) -> anyhow::Result<FeatureCategory> {
    from_str("category", s)
}

pub fn status(s: &str) -> anyhow::Result<FeatureStatus> {
    from_str("status", s)
}

pub fn work_item_type(s: &str) -> anyhow::Result<WorkItemType> {
    from_str("type", s)
}

pub fn insight_pattern_type(s: &str) -> anyhow::Result<InsightPatternType> {
    from_str("pattern type", s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values_parse() {
        assert_eq!(category("security").unwrap(), FeatureCategory::Security);
        assert_eq!(status("pending").unwrap(), FeatureStatus::Pending);
        assert_eq!(work_item_type("bug").unwrap(), WorkItemType::Bug);
    }

    #[test]
    fn unknown_value_is_a_user_error_not_a_panic() {
        let err = category("not-a-real-category").unwrap_err();
        assert!(err.to_string().contains("unknown category"));
    }
}
