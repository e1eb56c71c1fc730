use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A git commit observed by a Session. Relations:
/// `Session -MADE_COMMITS-> Commit`, `Commit -IMPLEMENTED_IN-> Feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    #[serde(default)]
    pub author: Option<String>,
    pub timestamp: DateTime<Utc>,
}
