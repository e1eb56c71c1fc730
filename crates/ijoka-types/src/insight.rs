use super::enums::InsightPatternType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A long-lived learning recorded against (optionally) a Feature. Relation:
/// `LEARNED_FROM -> Feature?`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub description: String,
    pub pattern_type: InsightPatternType,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub effectiveness_score: Option<f64>,
    #[serde(default)]
    pub feedback_count: u64,
    #[serde(default)]
    pub helpful_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    pub fn new(description: impl Into<String>, pattern_type: InsightPatternType) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            pattern_type,
            tags: BTreeSet::new(),
            usage_count: 0,
            effectiveness_score: None,
            feedback_count: 0,
            helpful_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Record feedback from `POST /analytics/feedback`; recomputes the
    /// effectiveness score as the running helpful ratio.
    pub fn record_feedback(&mut self, helpful: bool) {
        self.feedback_count += 1;
        if helpful {
            self.helpful_count += 1;
        }
        self.effectiveness_score = Some(self.helpful_count as f64 / self.feedback_count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_updates_effectiveness_score() {
        let mut i = Insight::new("use early returns", InsightPatternType::BestPractice);
        i.record_feedback(true);
        i.record_feedback(true);
        i.record_feedback(false);
        assert_eq!(i.feedback_count, 3);
        assert_eq!(i.helpful_count, 2);
        assert!((i.effectiveness_score.unwrap() - (2.0 / 3.0)).abs() < 1e-9);
    }
}
