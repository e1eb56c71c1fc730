//! Feature Store (spec.md §4.4): CRUD plus hierarchy and the similarity
//! check, layered over `ijoka-graph`'s node operations.

use crate::error::CoreError;
use crate::text::word_overlap_ratio;
use ijoka_graph::GraphGateway;
use ijoka_types::{Feature, FeatureStatus};
use uuid::Uuid;

pub async fn create(
    gw: &GraphGateway,
    feature: Feature,
    project_id: Uuid,
) -> Result<Feature, CoreError> {
    Ok(ijoka_graph::nodes::features::create(gw, feature, project_id).await?)
}

pub async fn get(gw: &GraphGateway, id: Uuid) -> Result<Feature, CoreError> {
    Ok(ijoka_graph::nodes::features::require(gw, id).await?)
}

pub async fn list(
    gw: &GraphGateway,
    project_id: Uuid,
    status: Option<FeatureStatus>,
) -> Result<Vec<Feature>, CoreError> {
    Ok(ijoka_graph::nodes::features::list_for_project(gw, project_id, status).await?)
}

pub async fn update(gw: &GraphGateway, feature: Feature) -> Result<(), CoreError> {
    Ok(ijoka_graph::nodes::features::save(gw, feature).await?)
}

pub async fn delete(gw: &GraphGateway, id: Uuid) -> Result<(), CoreError> {
    Ok(ijoka_graph::nodes::features::archive(gw, id).await?)
}

pub async fn get_children(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Feature>, CoreError> {
    Ok(ijoka_graph::nodes::features::get_children(gw, feature_id).await?)
}

pub async fn get_ancestors(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Feature>, CoreError> {
    Ok(ijoka_graph::nodes::features::get_ancestors(gw, feature_id).await?)
}

pub async fn get_descendants(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Feature>, CoreError> {
    Ok(ijoka_graph::nodes::features::get_descendants(gw, feature_id).await?)
}

/// Rejects cycles and self-parenting (I4); the ancestor check lives in
/// `ijoka-graph::edges::link_child_to_parent`.
pub async fn link_to_parent(gw: &GraphGateway, child: Uuid, parent: Uuid) -> Result<(), CoreError> {
    Ok(ijoka_graph::nodes::features::link_to_parent(gw, child, parent).await?)
}

pub async fn unlink_from_parent(gw: &GraphGateway, child: Uuid) -> Result<(), CoreError> {
    Ok(ijoka_graph::nodes::features::unlink_from_parent(gw, child).await?)
}

/// Union of events `LINKED_TO` the Feature and any of its descendants,
/// sorted by timestamp descending (spec.md §4.4, used to roll up activity
/// on epics).
pub async fn get_descendant_events(
    gw: &GraphGateway,
    feature_id: Uuid,
    limit: usize,
) -> Result<Vec<ijoka_types::Event>, CoreError> {
    let mut feature_ids = vec![feature_id];
    feature_ids.extend(
        get_descendants(gw, feature_id)
            .await?
            .into_iter()
            .map(|f| f.id),
    );
    let mut events = Vec::new();
    for fid in feature_ids {
        events.extend(ijoka_graph::nodes::events::events_linked_to(gw, fid, limit).await?);
    }
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(limit);
    Ok(events)
}

/// Similarity check (spec.md §4.4): exact case-insensitive match, then
/// >60% word-overlap, then substring containment -- strongest match wins,
/// deterministic, no embeddings.
pub fn find_similar<'a>(description: &str, candidates: &'a [Feature]) -> Option<&'a Feature> {
    let needle = description.to_lowercase();

    if let Some(exact) = candidates
        .iter()
        .find(|f| f.description.to_lowercase() == needle)
    {
        return Some(exact);
    }

    if let Some(overlap) = candidates
        .iter()
        .find(|f| word_overlap_ratio(description, &f.description) > 0.6)
    {
        return Some(overlap);
    }

    candidates.iter().find(|f| {
        f.description.to_lowercase().contains(&needle) || needle.contains(&f.description.to_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::{FeatureCategory, WorkItemType};

    fn feature(desc: &str) -> Feature {
        Feature::new_work_item(desc, FeatureCategory::Functional, WorkItemType::Feature, 0)
    }

    #[test]
    fn exact_match_wins_over_overlap() {
        let candidates = vec![feature("Add Login Page"), feature("add login")];
        let found = find_similar("add login", &candidates).unwrap();
        assert_eq!(found.description, "add login");
    }

    #[test]
    fn word_overlap_above_threshold_matches() {
        let candidates = vec![feature("rewrite the parser module for speed")];
        let found = find_similar("rewrite parser module", &candidates);
        assert!(found.is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let candidates = vec![feature("add login page")];
        assert!(find_similar("fix unrelated bug", &candidates).is_none());
    }
}
