use serde::{Deserialize, Serialize};

/// The kind of a dependency edge between two Features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependsOnKind {
    Blocks,
    Related,
}

/// Relation kinds in the attribution graph (spec.md §3). Carried as an
/// explicit enum rather than a bare string so the Graph Store Gateway can
/// validate edge kinds on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    BelongsTo,
    ChildOf,
    DependsOn,
    InProject,
    ContinuedFrom,
    TriggeredBy,
    LinkedTo,
    PartOfStep,
    ChangedStatus,
    MadeCommits,
    ImplementedIn,
    LearnedFrom,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::BelongsTo => "BELONGS_TO",
            EdgeKind::ChildOf => "CHILD_OF",
            EdgeKind::DependsOn => "DEPENDS_ON",
            EdgeKind::InProject => "IN_PROJECT",
            EdgeKind::ContinuedFrom => "CONTINUED_FROM",
            EdgeKind::TriggeredBy => "TRIGGERED_BY",
            EdgeKind::LinkedTo => "LINKED_TO",
            EdgeKind::PartOfStep => "PART_OF_STEP",
            EdgeKind::ChangedStatus => "CHANGED_STATUS",
            EdgeKind::MadeCommits => "MADE_COMMITS",
            EdgeKind::ImplementedIn => "IMPLEMENTED_IN",
            EdgeKind::LearnedFrom => "LEARNED_FROM",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_kind_as_str_matches_spec_names() {
        assert_eq!(EdgeKind::BelongsTo.as_str(), "BELONGS_TO");
        assert_eq!(EdgeKind::DependsOn.as_str(), "DEPENDS_ON");
        assert_eq!(EdgeKind::LinkedTo.as_str(), "LINKED_TO");
    }
}
