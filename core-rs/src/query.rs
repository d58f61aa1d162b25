//! Cache of server data fetched by pages
//!
//! Pages store responses under a string key; a persona switch drops the whole
//! cache so nothing fetched under the previous identity leaks into the next.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub value: JsonValue,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, CachedEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CachedEntry> {
        self.entries.read().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: JsonValue) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                CachedEntry {
                    value,
                    fetched_at: Utc::now(),
                },
            );
        }
    }

    /// Drop every entry whose key starts with `prefix`
    pub fn invalidate(&self, prefix: &str) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn invalidate_all(&self) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "Query cache invalidated");
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
