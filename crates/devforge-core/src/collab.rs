//! Ports to the external systems the wizard drives: an AI generator, a
//! repository host and a deploy host. `devforge-clients` provides the HTTP
//! implementations; tests substitute in-process fakes.

use crate::payload::{
    DeployConfig, FileEntry, GeneratedDocs, GeneratedScaffold, IdeaInput, ProjectPlan,
    PromptPolicy, RepoConfig, RepoResult,
};
use crate::settings::Settings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure reported by a collaborator. `message` is surfaced to the user
/// verbatim; `details` carries anything extra the remote returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CollaboratorError {}

pub type CollabResult<T> = std::result::Result<T, CollaboratorError>;

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// What a generation request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Plan,
    Docs,
    Scaffold,
    DeployConfig,
    Policy,
}

impl GenerationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Plan => "plan",
            GenerationKind::Docs => "docs",
            GenerationKind::Scaffold => "scaffold",
            GenerationKind::DeployConfig => "deploy_config",
            GenerationKind::Policy => "policy",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for deploy configuration generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub tech_stack: String,
    pub project_type: String,
    pub has_api: bool,
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn plan(&self, idea: &IdeaInput, settings: &Settings) -> CollabResult<ProjectPlan>;

    async fn docs(
        &self,
        plan: &ProjectPlan,
        repo_name: &str,
        settings: &Settings,
    ) -> CollabResult<GeneratedDocs>;

    async fn scaffold(
        &self,
        plan: &ProjectPlan,
        settings: &Settings,
    ) -> CollabResult<GeneratedScaffold>;

    async fn deploy_config(
        &self,
        request: &DeployRequest,
        settings: &Settings,
    ) -> CollabResult<DeployConfig>;

    async fn policy(
        &self,
        plan: &ProjectPlan,
        existing_rules: &PromptPolicy,
        settings: &Settings,
    ) -> CollabResult<PromptPolicy>;
}

// ---------------------------------------------------------------------------
// Repository host
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Login of the account the token belongs to.
    async fn authenticated_user(&self) -> CollabResult<String>;

    async fn create_repository(&self, config: &RepoConfig) -> CollabResult<RepoResult>;

    /// Write every file in one commit on `branch` and return its sha. The
    /// branch only moves once the whole batch is in place.
    async fn commit_files(
        &self,
        full_name: &str,
        branch: &str,
        files: &[FileEntry],
        message: &str,
    ) -> CollabResult<String>;

    /// Register a read-only deploy key; returns the host's key id.
    async fn add_deploy_key(&self, full_name: &str, title: &str, key: &str)
        -> CollabResult<u64>;

    async fn list_files(&self, full_name: &str) -> CollabResult<Vec<String>>;

    async fn read_file(&self, full_name: &str, path: &str) -> CollabResult<String>;
}

// ---------------------------------------------------------------------------
// Deploy host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployKey {
    pub id: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteParams {
    pub name: String,
    /// `owner/name` of the repository to build from; `None` for an
    /// unlinked site fed by direct file deploys.
    pub repo_full_name: Option<String>,
    pub branch: String,
    pub build_command: String,
    pub publish_dir: String,
    pub deploy_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteResult {
    pub site_id: String,
    pub site_url: String,
    pub admin_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    pub deploy_url: String,
}

#[async_trait]
pub trait DeployHost: Send + Sync {
    async fn create_deploy_key(&self) -> CollabResult<DeployKey>;

    async fn create_site(&self, params: &SiteParams) -> CollabResult<SiteResult>;

    /// Content-addressed deploy: only files the host does not already hold
    /// are uploaded.
    async fn deploy_files(&self, site_id: &str, files: &[FileEntry])
        -> CollabResult<DeployResult>;

    async fn set_env_vars(&self, site_id: &str, vars: &[(String, String)]) -> CollabResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_the_message() {
        let err = CollaboratorError::new("rate limited").with_details("retry-after: 30");
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.details.as_deref(), Some("retry-after: 30"));
    }

    #[test]
    fn generation_kind_names() {
        assert_eq!(GenerationKind::DeployConfig.to_string(), "deploy_config");
        assert_eq!(
            serde_json::to_value(GenerationKind::Policy).unwrap(),
            "policy"
        );
    }
}
