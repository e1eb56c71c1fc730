use crate::edges;
use crate::{GraphError, GraphGateway};
use ijoka_types::{EdgeKind, Insight, InsightPatternType};
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeSet;
use uuid::Uuid;

fn pattern_to_str(p: InsightPatternType) -> String {
    serde_json::to_value(p).unwrap().as_str().unwrap().to_string()
}
fn pattern_from_str(s: &str) -> InsightPatternType {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}

fn row_to_insight(row: &rusqlite::Row) -> rusqlite::Result<Insight> {
    let tags_json: String = row.get(3)?;
    let tags: BTreeSet<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    Ok(Insight {
        id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
        description: row.get(1)?,
        pattern_type: pattern_from_str(&row.get::<_, String>(2)?),
        tags,
        usage_count: row.get::<_, i64>(4)? as u64,
        effectiveness_score: row.get(5)?,
        feedback_count: row.get::<_, i64>(6)? as u64,
        helpful_count: row.get::<_, i64>(7)? as u64,
        created_at: row.get::<_, String>(8)?.parse().unwrap(),
    })
}

const SELECT_COLUMNS: &str = "id, description, pattern_type, tags, usage_count, \
     effectiveness_score, feedback_count, helpful_count, created_at";

fn upsert(c: &rusqlite::Connection, i: &Insight) -> rusqlite::Result<()> {
    c.execute(
        "INSERT INTO insights (id, description, pattern_type, tags, usage_count, \
             effectiveness_score, feedback_count, helpful_count, created_at) \
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9) \
         ON CONFLICT(id) DO UPDATE SET \
             description=excluded.description, pattern_type=excluded.pattern_type, \
             tags=excluded.tags, usage_count=excluded.usage_count, \
             effectiveness_score=excluded.effectiveness_score, \
             feedback_count=excluded.feedback_count, helpful_count=excluded.helpful_count",
        params![
            i.id.to_string(),
            i.description,
            pattern_to_str(i.pattern_type),
            serde_json::to_string(&i.tags).unwrap(),
            i.usage_count as i64,
            i.effectiveness_score,
            i.feedback_count as i64,
            i.helpful_count as i64,
            i.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub async fn save(gw: &GraphGateway, insight: Insight) -> Result<(), GraphError> {
    gw.write(move |c| upsert(c, &insight)).await
}

pub async fn create(
    gw: &GraphGateway,
    insight: Insight,
    feature_id: Option<Uuid>,
) -> Result<Insight, GraphError> {
    save(gw, insight.clone()).await?;
    if let Some(fid) = feature_id {
        edges::link(gw, EdgeKind::LearnedFrom, insight.id, fid, None).await?;
    }
    Ok(insight)
}

pub async fn get(gw: &GraphGateway, id: Uuid) -> Result<Option<Insight>, GraphError> {
    gw.read(move |c| {
        c.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM insights WHERE id = ?1"),
            params![id.to_string()],
            row_to_insight,
        )
        .optional()
    })
    .await
}

pub async fn list(
    gw: &GraphGateway,
    query: Option<String>,
    tags: Vec<String>,
    limit: usize,
) -> Result<Vec<Insight>, GraphError> {
    gw.read(move |c| {
        let mut stmt = c.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM insights ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([], row_to_insight)?;
        let mut out = Vec::new();
        for row in rows {
            let insight = row?;
            if let Some(q) = &query {
                if !insight.description.to_lowercase().contains(&q.to_lowercase()) {
                    continue;
                }
            }
            if !tags.is_empty() && !tags.iter().any(|t| insight.tags.contains(t)) {
                continue;
            }
            out.push(insight);
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_filters_by_query_and_tags() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let mut i1 = Insight::new("retry with backoff on 429", InsightPatternType::Solution);
        i1.tags.insert("networking".into());
        create(&gw, i1, None).await.unwrap();
        let i2 = Insight::new("avoid global mutable state", InsightPatternType::AntiPattern);
        create(&gw, i2, None).await.unwrap();

        let found = list(&gw, Some("retry".into()), vec![], 10).await.unwrap();
        assert_eq!(found.len(), 1);

        let by_tag = list(&gw, None, vec!["networking".into()], 10).await.unwrap();
        assert_eq!(by_tag.len(), 1);
    }
}
