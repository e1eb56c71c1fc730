//! Generic edge storage: `edges(kind, src_id, dst_id, props)`. Used for
//! every relation in spec.md §3 except `CHANGED_STATUS` (modeled as a
//! `feature_id` column on `status_events` for efficient "latest status"
//! lookups -- see SPEC_FULL.md §C).

use crate::{GraphError, GraphGateway};
use ijoka_types::EdgeKind;
use rusqlite::params;
use uuid::Uuid;

pub async fn link(
    gw: &GraphGateway,
    kind: EdgeKind,
    src: Uuid,
    dst: Uuid,
    props: Option<serde_json::Value>,
) -> Result<(), GraphError> {
    let kind_str = kind.as_str().to_string();
    let src = src.to_string();
    let dst = dst.to_string();
    let props = props.map(|p| p.to_string());
    gw.write(move |c| {
        c.execute(
            "INSERT INTO edges (kind, src_id, dst_id, props) VALUES (?1, ?2, ?3, ?4)",
            params![kind_str, src, dst, props],
        )
    })
    .await?;
    Ok(())
}

/// Insert the edge only if an identical `(kind, src, dst)` triple doesn't
/// already exist -- the MERGE-equivalent re-attribution needs (spec.md
/// §4.10 step 3: "MERGE a new LINKED_TO edge (idempotent)").
pub async fn link_if_absent(
    gw: &GraphGateway,
    kind: EdgeKind,
    src: Uuid,
    dst: Uuid,
) -> Result<bool, GraphError> {
    let kind_str = kind.as_str().to_string();
    let src_s = src.to_string();
    let dst_s = dst.to_string();
    gw.write(move |c| {
        let exists: i64 = c.query_row(
            "SELECT count(*) FROM edges WHERE kind = ?1 AND src_id = ?2 AND dst_id = ?3",
            params![kind_str, src_s, dst_s],
            |r| r.get(0),
        )?;
        if exists > 0 {
            return Ok(false);
        }
        c.execute(
            "INSERT INTO edges (kind, src_id, dst_id, props) VALUES (?1, ?2, ?3, NULL)",
            params![kind_str, src_s, dst_s],
        )?;
        Ok(true)
    })
    .await
}

pub async fn unlink(
    gw: &GraphGateway,
    kind: EdgeKind,
    src: Uuid,
    dst: Uuid,
) -> Result<(), GraphError> {
    let kind_str = kind.as_str().to_string();
    let src = src.to_string();
    let dst = dst.to_string();
    gw.write(move |c| {
        c.execute(
            "DELETE FROM edges WHERE kind = ?1 AND src_id = ?2 AND dst_id = ?3",
            params![kind_str, src, dst],
        )
    })
    .await?;
    Ok(())
}

pub async fn unlink_all_from(gw: &GraphGateway, kind: EdgeKind, src: Uuid) -> Result<(), GraphError> {
    let kind_str = kind.as_str().to_string();
    let src = src.to_string();
    gw.write(move |c| {
        c.execute(
            "DELETE FROM edges WHERE kind = ?1 AND src_id = ?2",
            params![kind_str, src],
        )
    })
    .await?;
    Ok(())
}

/// Reverse of `unlink_all_from`: drops every `kind` edge pointing *at*
/// `dst`, regardless of `src`. Needed when deleting a node that other rows
/// reference as the target end (e.g. a Feature other Features `DEPENDS_ON`).
pub async fn unlink_all_to(gw: &GraphGateway, kind: EdgeKind, dst: Uuid) -> Result<(), GraphError> {
    let kind_str = kind.as_str().to_string();
    let dst = dst.to_string();
    gw.write(move |c| {
        c.execute(
            "DELETE FROM edges WHERE kind = ?1 AND dst_id = ?2",
            params![kind_str, dst],
        )
    })
    .await?;
    Ok(())
}

/// All `dst_id`s reachable from `src` via one hop of `kind`.
pub async fn targets(gw: &GraphGateway, kind: EdgeKind, src: Uuid) -> Result<Vec<Uuid>, GraphError> {
    let kind_str = kind.as_str().to_string();
    let src = src.to_string();
    gw.read(move |c| {
        let mut stmt =
            c.prepare("SELECT dst_id FROM edges WHERE kind = ?1 AND src_id = ?2")?;
        let rows = stmt.query_map(params![kind_str, src], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            if let Ok(id) = row?.parse() {
                out.push(id);
            }
        }
        Ok(out)
    })
    .await
}

/// All `src_id`s that point at `dst` via one hop of `kind`.
pub async fn sources(gw: &GraphGateway, kind: EdgeKind, dst: Uuid) -> Result<Vec<Uuid>, GraphError> {
    let kind_str = kind.as_str().to_string();
    let dst = dst.to_string();
    gw.read(move |c| {
        let mut stmt =
            c.prepare("SELECT src_id FROM edges WHERE kind = ?1 AND dst_id = ?2")?;
        let rows = stmt.query_map(params![kind_str, dst], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            if let Ok(id) = row?.parse() {
                out.push(id);
            }
        }
        Ok(out)
    })
    .await
}

/// All `(dst_id, props)` pairs reachable from `src` via one hop of `kind`.
/// Used where the edge's `props` carry meaning beyond existence, e.g.
/// `DEPENDS_ON { kind: blocks | related }`.
pub async fn targets_with_props(
    gw: &GraphGateway,
    kind: EdgeKind,
    src: Uuid,
) -> Result<Vec<(Uuid, Option<serde_json::Value>)>, GraphError> {
    let kind_str = kind.as_str().to_string();
    let src = src.to_string();
    gw.read(move |c| {
        let mut stmt =
            c.prepare("SELECT dst_id, props FROM edges WHERE kind = ?1 AND src_id = ?2")?;
        let rows = stmt.query_map(params![kind_str, src], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, Option<String>>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, props) = row?;
            if let Ok(id) = id.parse() {
                let props = props.and_then(|p| serde_json::from_str(&p).ok());
                out.push((id, props));
            }
        }
        Ok(out)
    })
    .await
}

/// Depth-first ancestor walk via `CHILD_OF` edges; used both to answer
/// `get_ancestors` and to enforce invariant I4 before writing a new link.
pub async fn ancestors(gw: &GraphGateway, feature_id: Uuid) -> Result<Vec<Uuid>, GraphError> {
    let mut out = Vec::new();
    let mut frontier = vec![feature_id];
    while let Some(current) = frontier.pop() {
        for parent in targets(gw, EdgeKind::ChildOf, current).await? {
            if !out.contains(&parent) {
                out.push(parent);
                frontier.push(parent);
            }
        }
    }
    Ok(out)
}

/// Enforces invariant I4: `CHILD_OF` induces a DAG. Returns `CycleError`
/// without writing anything if `child` is already an ancestor of `parent`
/// (or `child == parent`).
pub async fn link_child_to_parent(
    gw: &GraphGateway,
    child: Uuid,
    parent: Uuid,
) -> Result<(), GraphError> {
    if child == parent {
        return Err(GraphError::CycleError(
            "a Feature cannot be its own parent".into(),
        ));
    }
    let parent_ancestors = ancestors(gw, parent).await?;
    if parent_ancestors.contains(&child) || parent == child {
        return Err(GraphError::CycleError(format!(
            "linking {child} as a child of {parent} would create a cycle"
        )));
    }
    unlink_all_from(gw, EdgeKind::ChildOf, child).await?;
    link(gw, EdgeKind::ChildOf, child, parent, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphGateway;

    #[tokio::test]
    async fn link_and_targets_round_trip() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        link(&gw, EdgeKind::LinkedTo, a, b, None).await.unwrap();
        let ts = targets(&gw, EdgeKind::LinkedTo, a).await.unwrap();
        assert_eq!(ts, vec![b]);
    }

    #[tokio::test]
    async fn link_if_absent_is_idempotent() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(link_if_absent(&gw, EdgeKind::LinkedTo, a, b).await.unwrap());
        assert!(!link_if_absent(&gw, EdgeKind::LinkedTo, a, b).await.unwrap());
        let ts = targets(&gw, EdgeKind::LinkedTo, a).await.unwrap();
        assert_eq!(ts.len(), 1);
    }

    #[tokio::test]
    async fn detects_direct_cycle() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        link_child_to_parent(&gw, a, b).await.unwrap();
        let result = link_child_to_parent(&gw, b, a).await;
        assert!(matches!(result, Err(GraphError::CycleError(_))));
    }

    #[tokio::test]
    async fn rejects_self_parent() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let a = Uuid::new_v4();
        let result = link_child_to_parent(&gw, a, a).await;
        assert!(matches!(result, Err(GraphError::CycleError(_))));
    }

    #[tokio::test]
    async fn unlink_all_to_drops_only_matching_kind_and_dst() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        link(&gw, EdgeKind::DependsOn, a, c, None).await.unwrap();
        link(&gw, EdgeKind::DependsOn, b, c, None).await.unwrap();
        link(&gw, EdgeKind::LinkedTo, a, c, None).await.unwrap();

        unlink_all_to(&gw, EdgeKind::DependsOn, c).await.unwrap();

        assert!(sources(&gw, EdgeKind::DependsOn, c).await.unwrap().is_empty());
        assert_eq!(sources(&gw, EdgeKind::LinkedTo, c).await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn detects_transitive_cycle() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        link_child_to_parent(&gw, a, b).await.unwrap(); // a -> b
        link_child_to_parent(&gw, b, c).await.unwrap(); // b -> c
        let result = link_child_to_parent(&gw, c, a).await; // would close the loop
        assert!(matches!(result, Err(GraphError::CycleError(_))));
    }
}
