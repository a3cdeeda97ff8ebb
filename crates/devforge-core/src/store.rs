//! Key-value persistence and the project gateway on top of it.
//!
//! # Key layout
//!
//! ```text
//! projects/<id>     JSON-encoded Project
//! settings/global   JSON-encoded Settings
//! ```
//!
//! The gateway never surfaces store failures: saves become logged no-ops and
//! reads degrade to "nothing stored". Callers that keep their own working copy
//! (the server, or a client holding the aggregate) carry on regardless.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use redb::{Database, ReadableTable, TableDefinition};
use serde_json::Value;

use crate::config::Config;
use crate::error::{ForgeError, Result};
use crate::project::Project;
use crate::settings::Settings;

pub const PROJECT_PREFIX: &str = "projects/";
pub const GLOBAL_SETTINGS_KEY: &str = "settings/global";

/// Minimal key-value contract the gateway needs.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
    /// Keys starting with `prefix`, in key order.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. `set_available(false)` makes every call fail, which is
/// how tests exercise the degraded paths.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ForgeError::Store("store unavailable".into()))
        }
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.check()?;
        let entries = self
            .entries
            .read()
            .map_err(|e| ForgeError::Store(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.check()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|e| ForgeError::Store(e.to_string()))?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.check()?;
        let entries = self
            .entries
            .read()
            .map_err(|e| ForgeError::Store(e.to_string()))?;
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// RedbStore
// ---------------------------------------------------------------------------

/// Key: store key. Value: JSON bytes.
const BLOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("blobs");

fn db_err(e: impl std::fmt::Display) -> ForgeError {
    ForgeError::Store(e.to_string())
}

/// Durable single-file store.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database at `path`, creating the table up front so
    /// reads never hit a missing table.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(BLOBS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }
}

impl KvStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(BLOBS).map_err(db_err)?;
        match table.get(key).map_err(db_err)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(BLOBS).map_err(db_err)?;
            table.insert(key, bytes.as_slice()).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(BLOBS).map_err(db_err)?;
        let mut keys = Vec::new();
        for entry in table.range(prefix..).map_err(db_err)? {
            let (k, _) = entry.map_err(db_err)?;
            let key = k.value();
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_string());
        }
        Ok(keys)
    }
}

// ---------------------------------------------------------------------------
// ProjectStore
// ---------------------------------------------------------------------------

/// Persistence gateway for project aggregates and global settings.
#[derive(Clone)]
pub struct ProjectStore {
    kv: Option<Arc<dyn KvStore>>,
}

impl ProjectStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv: Some(kv) }
    }

    /// Gateway with no backing store; every save is a no-op.
    pub fn detached() -> Self {
        Self { kv: None }
    }

    /// Gateway over the redb file named by `config`. A disabled or
    /// unopenable store yields a detached gateway.
    pub fn from_config(config: &Config, root: &Path) -> Self {
        let Some(path) = config.store_path(root) else {
            return Self::detached();
        };
        match RedbStore::open(&path) {
            Ok(db) => Self::new(Arc::new(db)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "store unavailable, projects will not be persisted"
                );
                Self::detached()
            }
        }
    }

    pub fn is_durable(&self) -> bool {
        self.kv.is_some()
    }

    /// Upsert `project` under its id. Returns whether the write landed.
    pub fn save(&self, project: &Project) -> bool {
        let Some(kv) = &self.kv else {
            tracing::debug!(id = %project.id, "no store configured, skipping save");
            return false;
        };
        let key = project_key(&project.id);
        let result = serde_json::to_value(project)
            .map_err(ForgeError::from)
            .and_then(|value| kv.set(&key, &value));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id = %project.id, error = %e, "project save failed");
                false
            }
        }
    }

    /// Stored aggregate for `id`, or `None` when absent, unreadable or the
    /// store is down.
    pub fn load(&self, id: &str) -> Option<Project> {
        let kv = self.kv.as_ref()?;
        match kv.get(&project_key(id)) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(project) => Some(project),
                Err(e) => {
                    tracing::warn!(id, error = %e, "stored project is unreadable");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(id, error = %e, "project load failed");
                None
            }
        }
    }

    /// Ids of every stored project; empty when the store is down.
    pub fn list(&self) -> Vec<String> {
        let Some(kv) = &self.kv else {
            return Vec::new();
        };
        match kv.list(PROJECT_PREFIX) {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(PROJECT_PREFIX).map(str::to_string))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "project list failed");
                Vec::new()
            }
        }
    }

    pub fn load_settings(&self) -> Option<Settings> {
        let kv = self.kv.as_ref()?;
        match kv.get(GLOBAL_SETTINGS_KEY) {
            Ok(value) => value.and_then(|v| serde_json::from_value(v).ok()),
            Err(e) => {
                tracing::warn!(error = %e, "settings load failed");
                None
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> bool {
        let Some(kv) = &self.kv else {
            return false;
        };
        let result = serde_json::to_value(settings)
            .map_err(ForgeError::from)
            .and_then(|value| kv.set(GLOBAL_SETTINGS_KEY, &value));
        if let Err(e) = &result {
            tracing::warn!(error = %e, "settings save failed");
        }
        result.is_ok()
    }
}

fn project_key(id: &str) -> String {
    format!("{PROJECT_PREFIX}{id}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
