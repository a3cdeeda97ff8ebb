//! Structured generation through OpenAI or Anthropic. The provider and model
//! come from the project's [`Settings`] on every call.

mod anthropic;
mod openai;
pub mod prompts;
pub mod schemas;

use async_trait::async_trait;
use devforge_core::collab::{CollabResult, DeployRequest, GenerationKind, Generator};
use devforge_core::config::AiConfig;
use devforge_core::payload::{
    DeployConfig, GeneratedDocs, GeneratedScaffold, IdeaInput, ProjectPlan, PromptPolicy,
};
use devforge_core::settings::{AiProvider, Settings};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::http;

pub use anthropic::KEY_VAR as ANTHROPIC_KEY_VAR;
pub use openai::KEY_VAR as OPENAI_KEY_VAR;

/// One structured generation request.
pub(crate) struct Task {
    pub kind: GenerationKind,
    pub system: &'static str,
    pub user: String,
    pub schema: Value,
}

pub struct AiGenerator {
    http: reqwest::Client,
    openai_url: String,
    anthropic_url: String,
    openai_key: Option<String>,
    anthropic_key: Option<String>,
    temperature: f32,
}

impl AiGenerator {
    pub fn new(
        config: &AiConfig,
        openai_key: Option<String>,
        anthropic_key: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            http: http::client()?,
            openai_url: config.openai_url.clone(),
            anthropic_url: config.anthropic_url.clone(),
            openai_key,
            anthropic_key,
            temperature: config.temperature,
        })
    }

    pub fn from_env(config: &AiConfig) -> Result<Self> {
        Self::new(
            config,
            http::env_token(OPENAI_KEY_VAR),
            http::env_token(ANTHROPIC_KEY_VAR),
        )
    }

    async fn generate<T: DeserializeOwned>(&self, task: Task, settings: &Settings) -> Result<T> {
        let model = settings.effective_model();
        tracing::debug!(kind = %task.kind, provider = %settings.ai_provider, model, "generating");
        let value = match settings.ai_provider {
            AiProvider::OpenAi => {
                let key = self
                    .openai_key
                    .as_deref()
                    .ok_or(ClientError::MissingCredential(OPENAI_KEY_VAR))?;
                openai::complete(&self.http, &self.openai_url, key, model, self.temperature, &task)
                    .await?
            }
            AiProvider::Anthropic => {
                let key = self
                    .anthropic_key
                    .as_deref()
                    .ok_or(ClientError::MissingCredential(ANTHROPIC_KEY_VAR))?;
                anthropic::complete(
                    &self.http,
                    &self.anthropic_url,
                    key,
                    model,
                    self.temperature,
                    &task,
                )
                .await?
            }
        };
        serde_json::from_value(value).map_err(|e| ClientError::Decode {
            context: format!("{} output", task.kind),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Generator for AiGenerator {
    async fn plan(&self, idea: &IdeaInput, settings: &Settings) -> CollabResult<ProjectPlan> {
        let task = Task {
            kind: GenerationKind::Plan,
            system: prompts::PLANNER_SYSTEM,
            user: prompts::plan(idea),
            schema: schemas::plan(),
        };
        Ok(self.generate(task, settings).await?)
    }

    async fn docs(
        &self,
        plan: &ProjectPlan,
        repo_name: &str,
        settings: &Settings,
    ) -> CollabResult<GeneratedDocs> {
        let task = Task {
            kind: GenerationKind::Docs,
            system: prompts::DOCS_SYSTEM,
            user: prompts::docs(plan, repo_name),
            schema: schemas::docs(),
        };
        Ok(self.generate(task, settings).await?)
    }

    async fn scaffold(
        &self,
        plan: &ProjectPlan,
        settings: &Settings,
    ) -> CollabResult<GeneratedScaffold> {
        let task = Task {
            kind: GenerationKind::Scaffold,
            system: prompts::SCAFFOLD_SYSTEM,
            user: prompts::scaffold(plan),
            schema: schemas::scaffold(),
        };
        Ok(self.generate(task, settings).await?)
    }

    async fn deploy_config(
        &self,
        request: &DeployRequest,
        settings: &Settings,
    ) -> CollabResult<DeployConfig> {
        let task = Task {
            kind: GenerationKind::DeployConfig,
            system: prompts::DEPLOY_SYSTEM,
            user: prompts::deploy(request),
            schema: schemas::deploy_config(),
        };
        Ok(self.generate(task, settings).await?)
    }

    async fn policy(
        &self,
        plan: &ProjectPlan,
        existing_rules: &PromptPolicy,
        settings: &Settings,
    ) -> CollabResult<PromptPolicy> {
        let task = Task {
            kind: GenerationKind::Policy,
            system: prompts::POLICY_SYSTEM,
            user: prompts::policy(plan, existing_rules),
            schema: schemas::policy(),
        };
        Ok(self.generate(task, settings).await?)
    }
}
