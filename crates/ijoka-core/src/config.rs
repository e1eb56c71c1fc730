//! Top-level configuration loaded from `~/.ijoka/config.toml`, modeled on
//! the teacher's `at-core::config::Config` (section structs, `#[serde(default)]`
//! everywhere, `Config::load`/`load_from`/`to_toml`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub nudges: NudgesConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ijoka")
            .join("config.toml")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// A Session is considered stale when `last_activity` is older than
    /// this many minutes (spec.md §3 "Lifecycle", default 30).
    #[serde(default = "default_stale_minutes")]
    pub stale_threshold_minutes: i64,
    #[serde(default = "default_request_deadline")]
    pub request_deadline_seconds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            stale_threshold_minutes: default_stale_minutes(),
            request_deadline_seconds: default_request_deadline(),
        }
    }
}

fn default_stale_minutes() -> i64 {
    30
}
fn default_request_deadline() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
            acquire_timeout_seconds: default_acquire_timeout(),
        }
    }
}

fn default_db_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ijoka")
        .join("graph.sqlite3")
        .to_string_lossy()
        .into_owned()
}
fn default_pool_size() -> usize {
    ijoka_graph::gateway::DEFAULT_POOL_SIZE
}
fn default_acquire_timeout() -> u64 {
    ijoka_graph::gateway::DEFAULT_ACQUIRE_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}
fn default_bind_addr() -> String {
    "127.0.0.1:8420".to_string()
}

/// Open Question resolution (SPEC_FULL.md §E.3): meta-tool / diagnostic
/// detection is a configurable allow-list rather than a hardcoded literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default = "default_meta_tools")]
    pub meta_tools: Vec<String>,
    #[serde(default = "default_diagnostic_patterns")]
    pub diagnostic_patterns: Vec<String>,
    #[serde(default = "default_work_tools")]
    pub work_tools: Vec<String>,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default = "default_prompt_confidence_threshold")]
    pub prompt_confidence_threshold: f64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            meta_tools: default_meta_tools(),
            diagnostic_patterns: default_diagnostic_patterns(),
            work_tools: default_work_tools(),
            score_threshold: default_score_threshold(),
            prompt_confidence_threshold: default_prompt_confidence_threshold(),
        }
    }
}

fn default_meta_tools() -> Vec<String> {
    vec!["mcp__ijoka__*".to_string()]
}
fn default_diagnostic_patterns() -> Vec<String> {
    vec!["ijoka".to_string()]
}
fn default_work_tools() -> Vec<String> {
    [
        "Edit", "Write", "Read", "Bash", "Grep", "Glob", "Task", "TodoWrite", "WebSearch",
        "WebFetch", "NotebookEdit",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_score_threshold() -> f64 {
    0.15
}
fn default_prompt_confidence_threshold() -> f64 {
    0.40
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgesConfig {
    #[serde(default = "default_commit_reminder_threshold")]
    pub commit_reminder_edit_threshold: u32,
    #[serde(default = "default_work_count_threshold")]
    pub default_work_count_threshold: u64,
}

impl Default for NudgesConfig {
    fn default() -> Self {
        Self {
            commit_reminder_edit_threshold: default_commit_reminder_threshold(),
            default_work_count_threshold: default_work_count_threshold(),
        }
    }
}
fn default_commit_reminder_threshold() -> u32 {
    5
}
fn default_work_count_threshold() -> u64 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let toml_str = cfg.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.general.stale_threshold_minutes,
            cfg.general.stale_threshold_minutes
        );
        assert_eq!(parsed.attribution.work_tools, cfg.attribution.work_tools);
    }
}
