pub mod deploy;
pub mod docs;
pub mod idea;
pub mod init;
pub mod plan;
pub mod project;
pub mod repo;
pub mod scan;
pub mod serve;
pub mod settings;
pub mod step;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use devforge_clients::{AiGenerator, GitHubClient, NetlifyClient};
use devforge_core::config::Config;
use devforge_core::orchestrator::{StepOutcome, Wizard};
use devforge_core::store::ProjectStore;
use devforge_core::{ForgeError, Project};

use crate::output::emit_project;

/// Config and store for an initialized root.
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    pub store: ProjectStore,
}

impl Workspace {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root)?;
        let store = ProjectStore::from_config(&config, root);
        if !store.is_durable() {
            bail!("project store is unavailable; check store.enabled and store.path in .devforge/config.yaml");
        }
        Ok(Self {
            root: root.to_path_buf(),
            config,
            store,
        })
    }

    pub fn load(&self, id: &str) -> anyhow::Result<Project> {
        self.store
            .load(id)
            .ok_or_else(|| ForgeError::ProjectNotFound(id.to_string()).into())
    }

    pub fn save(&self, project: &Project) -> anyhow::Result<()> {
        if !self.store.save(project) {
            bail!("failed to save project {}", project.id);
        }
        Ok(())
    }

    /// Controllers wired to the real collaborators.
    pub fn wizard(&self) -> anyhow::Result<Wizard> {
        let generator = AiGenerator::from_env(&self.config.ai)?;
        let github = GitHubClient::from_env(self.config.github.api_url.clone())?;
        let netlify = NetlifyClient::from_env(self.config.netlify.api_url.clone())?;
        Ok(
            Wizard::new(Arc::new(generator), Arc::new(github), Arc::new(netlify))
                .with_link_repository(self.config.netlify.link_repository),
        )
    }

    /// Save an engine result and print it.
    pub fn commit(&self, project: Project, json: bool) -> anyhow::Result<()> {
        self.save(&project)?;
        emit_project(&project, json)
    }

    /// Save a controller outcome and print it. A failed outcome is saved
    /// before it is reported so `step retry` can pick it up.
    pub fn settle(&self, outcome: StepOutcome, json: bool) -> anyhow::Result<()> {
        let error = outcome.error().map(str::to_string);
        let project = outcome.into_project();
        self.save(&project)?;
        emit_project(&project, json)?;
        match error {
            Some(message) => Err(anyhow!(message))
                .with_context(|| format!("step '{}' failed", project.current_step)),
            None => Ok(()),
        }
    }
}

/// Run one async controller call to completion.
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(future))
}

/// Load `id`, run a controller against it, save and print the outcome.
pub fn run_step<F, Fut>(root: &Path, id: &str, json: bool, f: F) -> anyhow::Result<()>
where
    F: FnOnce(Wizard, Project) -> Fut,
    Fut: Future<Output = devforge_core::Result<StepOutcome>>,
{
    let ws = Workspace::open(root)?;
    let project = ws.load(id)?;
    let wizard = ws.wizard()?;
    let outcome = block_on(f(wizard, project))??;
    ws.settle(outcome, json)
}
