use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root of all other data for one git working tree. `path` is the canonical
/// git-root of the calling workspace; uniqueness is enforced by the Graph
/// Store Gateway, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Construct a new Project for first-reference creation (`ensure_project`).
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            name: name.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}
