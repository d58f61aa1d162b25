//! Key/value stores backing the console's durable state
//!
//! Two scopes exist:
//! - local: survives restarts (file-backed), holds the active demo persona
//! - session: lives as long as the running context, holds the demo banner flag

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::errors::{Result, SccError};

/// Local key storing the active simulated persona id
pub const PERSONA_KEY: &str = "scc.demoPersona";

/// Session key set once the non-production banner was dismissed
pub const BANNER_DISMISSED_KEY: &str = "scc.demoBannerDismissed";

/// String key/value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, used for session scope and in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SccError::Store("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SccError::Store("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON-file backed store for local scope
///
/// The whole map is rewritten on every mutation; the file only ever holds a
/// handful of keys.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// An unreadable or corrupt file is treated as empty so a damaged state
    /// file can never prevent the console from starting.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding corrupt state file");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened local state");

        Ok(FileStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SccError::Store("file store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SccError::Store("file store lock poisoned".to_string()))?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

/// Local and session scoped stores handed to the console context
#[derive(Clone)]
pub struct LocalState {
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl LocalState {
    pub fn new(local: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        LocalState { local, session }
    }

    /// Both scopes in memory (tests, one-shot CLI runs)
    pub fn in_memory() -> Self {
        LocalState::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Local scope persisted under `state_dir/local.json`, fresh session scope
    pub fn persistent<P: AsRef<Path>>(state_dir: P) -> Result<Self> {
        let local = FileStore::open(state_dir.as_ref().join("local.json"))?;
        Ok(LocalState::new(Arc::new(local), Arc::new(MemoryStore::new())))
    }

    pub fn local(&self) -> &Arc<dyn KeyValueStore> {
        &self.local
    }

    pub fn session(&self) -> &Arc<dyn KeyValueStore> {
        &self.session
    }
}

impl std::fmt::Debug for LocalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalState").finish_non_exhaustive()
    }
}
