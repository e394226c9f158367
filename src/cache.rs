use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache write failed: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    // None means nothing is ever written to disk
    path: Option<PathBuf>,
    entries: Map<String, Value>,
}

impl ResponseCache {
    /// Opens the document at `path`. A missing or corrupt document is a cold cache.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = read_entries(&path).unwrap_or_default();

        info!(path = %path.display(), entries = entries.len(), "cache loaded");

        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Not persisted until the next insert
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        self.save()
    }

    /// A failed fetch leaves the cache untouched.
    pub async fn get_or_fetch<F, Fut, E>(&mut self, key: &str, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: From<CacheError>,
    {
        if let Some(value) = self.entries.get(key) {
            debug!(key, "using cache");
            return Ok(value.clone());
        }

        info!(key, "fetching");
        let value = fetch().await?;
        self.insert(key, value.clone())?;

        Ok(value)
    }

    // Whole store, every time; no atomic rename
    pub fn save(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string(&self.entries)?;

        fs::write(path, json).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })
    }
}

fn read_entries(path: &Path) -> Option<Map<String, Value>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no cache document, starting cold");
            return None;
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(entries)) => Some(entries),
        Ok(_) => {
            warn!(path = %path.display(), "cache document is not a JSON object, starting cold");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt cache document, starting cold");
            None
        }
    }
}
