use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use devforge_clients::{AiGenerator, GitHubClient, NetlifyClient};
use devforge_core::config::Config;
use devforge_core::orchestrator::Wizard;
use devforge_core::project::LogEntry;
use devforge_core::settings::Settings;
use devforge_core::store::ProjectStore;
use devforge_core::Project;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::error::AppError;

/// One activity entry appended to a project, as pushed over SSE.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub project_id: String,
    pub revision: u64,
    pub entry: LogEntry,
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub store: ProjectStore,
    pub wizard: Wizard,
    pub event_tx: broadcast::Sender<ActivityEvent>,
    /// Last aggregate seen per id. Serves reads when the store is detached
    /// or down. Entries are kept for the life of the process, including ones
    /// the store already holds, so a later store outage still finds them;
    /// memory grows with the number of projects touched.
    working: Arc<RwLock<HashMap<String, Project>>>,
    /// Global settings written while the store could not take them.
    settings: Arc<RwLock<Option<Settings>>>,
}

impl AppState {
    pub fn new(root: PathBuf, config: Config, store: ProjectStore, wizard: Wizard) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            root,
            config: Arc::new(config),
            store,
            wizard,
            event_tx: tx,
            working: Arc::new(RwLock::new(HashMap::new())),
            settings: Arc::new(RwLock::new(None)),
        }
    }

    /// State wired to the real collaborators. Credentials come from the
    /// environment; a missing one only fails the calls that need it.
    pub fn from_config(root: PathBuf, config: Config) -> anyhow::Result<Self> {
        let store = ProjectStore::from_config(&config, &root);
        let generator = AiGenerator::from_env(&config.ai)?;
        let github = GitHubClient::from_env(config.github.api_url.clone())?;
        let netlify = NetlifyClient::from_env(config.netlify.api_url.clone())?;
        let wizard = Wizard::new(Arc::new(generator), Arc::new(github), Arc::new(netlify))
            .with_link_repository(config.netlify.link_repository);
        tracing::info!(durable = store.is_durable(), "app state ready");
        Ok(Self::new(root, config, store, wizard))
    }

    /// Newest known copy of `id`, comparing the store with the working copy.
    pub async fn load(&self, id: &str) -> Result<Project, AppError> {
        let store = self.store.clone();
        let key = id.to_string();
        let stored = tokio::task::spawn_blocking(move || store.load(&key))
            .await
            .map_err(AppError::join)?;
        let working = self.working.read().await.get(id).cloned();

        let newest = match (stored, working) {
            (Some(s), Some(w)) => Some(if s.revision > w.revision { s } else { w }),
            (s, w) => s.or(w),
        };
        newest.ok_or_else(|| AppError::not_found(id))
    }

    /// Every id in the store or the working copy, sorted.
    pub async fn project_ids(&self) -> Result<Vec<String>, AppError> {
        let store = self.store.clone();
        let stored = tokio::task::spawn_blocking(move || store.list())
            .await
            .map_err(AppError::join)?;
        let working = self.working.read().await;
        let ids: BTreeSet<String> = stored.into_iter().chain(working.keys().cloned()).collect();
        Ok(ids.into_iter().collect())
    }

    /// Record `next` as the current aggregate: working copy, store, then an
    /// event for every activity entry `before` did not have.
    pub async fn persist(&self, before: Option<&Project>, next: &Project) -> Result<(), AppError> {
        self.working
            .write()
            .await
            .insert(next.id.clone(), next.clone());

        let store = self.store.clone();
        let snapshot = next.clone();
        let saved = tokio::task::spawn_blocking(move || store.save(&snapshot))
            .await
            .map_err(AppError::join)?;
        if !saved && self.store.is_durable() {
            tracing::warn!(id = %next.id, "project kept in memory only");
        }

        let seen: HashSet<&str> = before
            .map(|p| p.activity.iter().map(|e| e.id.as_str()).collect())
            .unwrap_or_default();
        for entry in next.activity.iter().filter(|e| !seen.contains(e.id.as_str())) {
            // No subscribers is fine.
            let _ = self.event_tx.send(ActivityEvent {
                project_id: next.id.clone(),
                revision: next.revision,
                entry: entry.clone(),
            });
        }
        Ok(())
    }

    /// Stored global settings, else the last ones written here, else the
    /// config defaults.
    pub async fn global_settings(&self) -> Result<Settings, AppError> {
        let store = self.store.clone();
        let stored = tokio::task::spawn_blocking(move || store.load_settings())
            .await
            .map_err(AppError::join)?;
        if let Some(settings) = stored {
            return Ok(settings);
        }
        if let Some(settings) = self.settings.read().await.clone() {
            return Ok(settings);
        }
        Ok(self.config.default_settings())
    }

    pub async fn set_global_settings(&self, settings: Settings) -> Result<bool, AppError> {
        *self.settings.write().await = Some(settings.clone());
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.save_settings(&settings))
            .await
            .map_err(AppError::join)
    }
}
