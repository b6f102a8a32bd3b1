//! On-disk snapshots of catalogue service responses.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cached response and when it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Time the response was fetched.
    pub cached: DateTime<Utc>,
    /// Response body.
    pub res: Value,
}

/// Directory of cached responses keyed by request.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
}

impl ResponseCache {
    /// Cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the snapshots.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' })
            .collect();
        self.root.join(format!("{file}.json"))
    }

    /// Load the snapshot for `key`, returning `None` if it does not exist.
    pub fn load(&self, key: &str) -> Result<Option<CachedResponse>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read cache entry {}", path.display()))?;
        let cached = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse cache entry {}", path.display()))?;
        Ok(Some(cached))
    }

    /// Store `res` under `key`, creating the cache directory if needed.
    pub fn persist(&self, key: &str, res: &Value) -> Result<()> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("failed to create cache directory {}", self.root.display())
        })?;

        let path = self.path_for(key);
        let entry = CachedResponse {
            cached: Utc::now(),
            res: res.clone(),
        };
        let serialized =
            serde_json::to_string(&entry).context("failed to serialize cached response")?;
        fs::write(&path, serialized)
            .with_context(|| format!("failed to write cache entry {}", path.display()))
    }
}
