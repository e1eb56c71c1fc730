//! Background shell cache (spec.md §6 "Persisted state"): a bounded,
//! LRU-trimmed `shell_id -> originating Bash command` map persisted to
//! `~/.ijoka/background_shells.json`, used solely to enrich BashOutput
//! events. The only on-disk state the process keeps besides logs.
//!
//! Grounded in the teacher's `at-core::session_store::SessionStore`
//! file-backed LRU pattern, adapted from per-id JSON files to a single
//! JSON map (the cached value here is a single string, not worth a
//! file-per-entry).

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;

pub const MAX_ENTRIES: usize = 50;

#[derive(Debug, Error)]
pub enum BackgroundShellsError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OnDisk {
    entries: Vec<(String, String)>,
}

/// In-memory LRU cache of `shell_id -> command`, periodically flushed to
/// disk. Not a Graph Store Gateway concern: this is explicitly the one
/// piece of local file state the core is allowed to keep (spec.md §6).
pub struct BackgroundShellCache {
    path: PathBuf,
    cache: Mutex<LruCache<String, String>>,
}

impl BackgroundShellCache {
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ijoka")
            .join("background_shells.json")
    }

    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, BackgroundShellsError> {
        let path = path.into();
        let capacity = NonZeroUsize::new(MAX_ENTRIES).expect("MAX_ENTRIES is non-zero");
        let mut cache = LruCache::new(capacity);
        if path.exists() {
            let text = tokio::fs::read_to_string(&path).await?;
            let on_disk: OnDisk = serde_json::from_str(&text)?;
            for (shell_id, command) in on_disk.entries {
                cache.put(shell_id, command);
            }
        }
        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    pub async fn record(&self, shell_id: impl Into<String>, command: impl Into<String>) -> Result<(), BackgroundShellsError> {
        let mut cache = self.cache.lock().await;
        cache.put(shell_id.into(), command.into());
        self.flush(&cache).await
    }

    pub async fn lookup(&self, shell_id: &str) -> Option<String> {
        let mut cache = self.cache.lock().await;
        cache.get(shell_id).cloned()
    }

    async fn flush(&self, cache: &LruCache<String, String>) -> Result<(), BackgroundShellsError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let entries: Vec<(String, String)> = cache.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let on_disk = OnDisk { entries };
        let text = serde_json::to_string_pretty(&on_disk)?;
        tokio::fs::write(&self.path, text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_and_lookup_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("background_shells.json");
        let cache = BackgroundShellCache::load(&path).await.unwrap();
        cache.record("shell-1", "npm run dev").await.unwrap();
        assert_eq!(cache.lookup("shell-1").await, Some("npm run dev".to_string()));
    }

    #[tokio::test]
    async fn persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("background_shells.json");
        {
            let cache = BackgroundShellCache::load(&path).await.unwrap();
            cache.record("shell-1", "cargo watch").await.unwrap();
        }
        let reloaded = BackgroundShellCache::load(&path).await.unwrap();
        assert_eq!(reloaded.lookup("shell-1").await, Some("cargo watch".to_string()));
    }
}
