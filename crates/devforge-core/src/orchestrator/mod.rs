//! Step controllers: each one guards on the step status, calls a
//! collaborator with upstream data and writes the result back into a new
//! aggregate.
//!
//! Guard violations come back as `Err`. Collaborator failures are not errors
//! at this level: the step is moved to `error` and the failed aggregate is
//! returned inside [`StepOutcome::Failed`] so callers can persist it and offer
//! a retry.

use std::sync::Arc;

use chrono::Utc;

use crate::collab::{
    CollaboratorError, DeployHost, DeployRequest, Generator, RepoHost, SiteParams, SiteResult,
};
use crate::error::{ForgeError, Result};
use crate::paths;
use crate::payload::{
    CommitRecord, Deployment, FileEntry, GeneratedDocs, IdeaInput, ProjectPlan, RepoConfig,
    AI_RULES_MD, NETLIFY_TOML,
};
use crate::project::Project;
use crate::rules;
use crate::types::{LogLevel, Step, StepStatus};

pub const DOCS_COMMIT_MESSAGE: &str = "feat: add app scaffold and documentation";
pub const NETLIFY_COMMIT_MESSAGE: &str = "chore: add netlify configuration";
pub const DEPLOY_KEY_TITLE: &str = "Netlify";
pub const DEFAULT_BUILD_COMMAND: &str = "npm run build";
pub const DEFAULT_PUBLISH_DIR: &str = ".next";
const DEFAULT_PROJECT_TYPE: &str = "web-app";

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Ok(Project),
    /// A collaborator failed; `project` has the step in `error`.
    Failed { project: Project, message: String },
}

impl StepOutcome {
    pub fn project(&self) -> &Project {
        match self {
            StepOutcome::Ok(p) => p,
            StepOutcome::Failed { project, .. } => project,
        }
    }

    pub fn into_project(self) -> Project {
        match self {
            StepOutcome::Ok(p) => p,
            StepOutcome::Failed { project, .. } => project,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StepOutcome::Ok(_) => None,
            StepOutcome::Failed { message, .. } => Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok(_))
    }
}

// ---------------------------------------------------------------------------
// Engine operations with activity logging
// ---------------------------------------------------------------------------

pub fn approve(project: &Project, step: Step) -> Result<Project> {
    let mut next = project.approve_and_advance(step)?;
    let message = if next.is_finished() {
        "Project complete".to_string()
    } else {
        format!("{} approved", title(step))
    };
    next.record(LogLevel::Success, step, message, None);
    tracing::info!(id = %next.id, %step, current = %next.current_step, "step approved");
    Ok(next)
}

pub fn retry(project: &Project, step: Step) -> Result<Project> {
    let mut next = project.retry(step)?;
    next.record(LogLevel::Info, step, "Retrying", None);
    Ok(next)
}

pub fn fail(project: &Project, step: Step, message: &str) -> Result<Project> {
    let mut next = project.fail(step, message)?;
    next.record(LogLevel::Error, step, message, None);
    tracing::error!(id = %next.id, %step, message, "step marked failed");
    Ok(next)
}

pub fn go_back(project: &Project) -> Result<Project> {
    let from = project.current_step;
    let mut next = project.go_back()?;
    next.record(
        LogLevel::Info,
        next.current_step,
        format!("Went back from {from}"),
        None,
    );
    Ok(next)
}

pub fn edit_plan(project: &Project, plan: ProjectPlan) -> Result<Project> {
    let mut next = project.edit_plan(plan)?;
    next.record(LogLevel::Info, Step::Plan, "Plan edited", None);
    Ok(next)
}

pub fn edit_docs(project: &Project, docs: GeneratedDocs) -> Result<Project> {
    let mut next = project.edit_docs(docs)?;
    next.record(LogLevel::Info, Step::Docs, "Documentation edited", None);
    Ok(next)
}

/// Repository name derived from the first sentence of the plan summary.
pub fn suggested_repo_name(plan: &ProjectPlan) -> String {
    paths::slugify(plan.headline())
}

fn title(step: Step) -> &'static str {
    match step {
        Step::Idea => "Idea",
        Step::Plan => "Plan",
        Step::Repo => "Repository",
        Step::Docs => "Documentation",
        Step::Deploy => "Deployment",
    }
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

/// Controllers bound to a set of collaborators.
#[derive(Clone)]
pub struct Wizard {
    generator: Arc<dyn Generator>,
    repo_host: Arc<dyn RepoHost>,
    deploy_host: Arc<dyn DeployHost>,
    link_repository: bool,
}

impl Wizard {
    pub fn new(
        generator: Arc<dyn Generator>,
        repo_host: Arc<dyn RepoHost>,
        deploy_host: Arc<dyn DeployHost>,
    ) -> Self {
        Self {
            generator,
            repo_host,
            deploy_host,
            link_repository: true,
        }
    }

    /// Skip the repository-linked site attempt and always deploy files directly.
    pub fn with_link_repository(mut self, link: bool) -> Self {
        self.link_repository = link;
        self
    }

    pub fn repo_host(&self) -> &Arc<dyn RepoHost> {
        &self.repo_host
    }

    // -----------------------------------------------------------------------
    // Idea / plan
    // -----------------------------------------------------------------------

    /// Record the idea, generate a plan from it and move on to the plan step.
    pub async fn submit_idea(&self, project: &Project, idea: IdeaInput) -> Result<StepOutcome> {
        let idea = idea.normalized();
        if idea.description.is_empty() {
            return Err(ForgeError::InvalidInput(
                "idea description must not be empty".into(),
            ));
        }
        let mut working = begin(project, Step::Idea)?;
        working.record(LogLevel::Info, Step::Idea, "Generating plan...", None);

        // A failed submission keeps whatever idea was stored before it.
        match self.generator.plan(&idea, &working.settings).await {
            Ok(plan) => {
                working.idea = Some(idea);
                let mut next = approve(&working, Step::Idea)?;
                next.plan = Some(plan);
                Ok(succeed(next, Step::Plan, "Plan generated"))
            }
            Err(e) => failure(working, Step::Idea, e),
        }
    }

    pub async fn generate_plan(&self, project: &Project) -> Result<StepOutcome> {
        let mut working = begin(project, Step::Plan)?;
        let idea = working
            .upstream(Step::Idea, &working.idea, "idea")?
            .clone();
        working.record(LogLevel::Info, Step::Plan, "Regenerating plan...", None);

        match self.generator.plan(&idea, &working.settings).await {
            Ok(plan) => {
                working.plan = Some(plan);
                Ok(succeed(working, Step::Plan, "Plan generated"))
            }
            Err(e) => failure(working, Step::Plan, e),
        }
    }

    // -----------------------------------------------------------------------
    // Repository
    // -----------------------------------------------------------------------

    pub async fn create_repository(
        &self,
        project: &Project,
        config: RepoConfig,
    ) -> Result<StepOutcome> {
        paths::validate_repo_name(&config.name)?;
        if project.repo_result.is_some() {
            return Err(ForgeError::InvalidInput(
                "repository already created for this project".into(),
            ));
        }
        let mut working = begin(project, Step::Repo)?;
        working.upstream(Step::Plan, &working.plan, "plan")?;
        let target = if config.owner.is_empty() {
            config.name.clone()
        } else {
            format!("{}/{}", config.owner, config.name)
        };
        working.record(
            LogLevel::Info,
            Step::Repo,
            format!("Creating repository {target}..."),
            None,
        );

        match self.repo_host.create_repository(&config).await {
            Ok(result) => {
                let message = format!("Repository created: {}", result.url);
                working.repo = Some(config);
                working.repo_result = Some(result);
                Ok(succeed(working, Step::Repo, message))
            }
            Err(e) => failure(working, Step::Repo, e),
        }
    }

    // -----------------------------------------------------------------------
    // Docs
    // -----------------------------------------------------------------------

    pub async fn generate_docs(&self, project: &Project) -> Result<StepOutcome> {
        let mut working = begin(project, Step::Docs)?;
        let plan = working.upstream(Step::Plan, &working.plan, "plan")?.clone();
        let repo = working
            .upstream(Step::Repo, &working.repo_result, "repository")?
            .clone();
        working.record(LogLevel::Info, Step::Docs, "Generating documentation...", None);

        match self
            .generator
            .docs(&plan, repo.short_name(), &working.settings)
            .await
        {
            Ok(docs) => {
                working.docs = Some(docs);
                working.docs_commit = None;
                Ok(succeed(working, Step::Docs, "Documentation generated"))
            }
            Err(e) => failure(working, Step::Docs, e),
        }
    }

    pub async fn generate_scaffold(&self, project: &Project) -> Result<StepOutcome> {
        let mut working = begin(project, Step::Docs)?;
        let plan = working.upstream(Step::Plan, &working.plan, "plan")?.clone();
        working.record(LogLevel::Info, Step::Docs, "Generating app scaffold...", None);

        match self.generator.scaffold(&plan, &working.settings).await {
            Ok(scaffold) => {
                let message = format!("App scaffold generated ({} files)", scaffold.files.len());
                working.scaffold = Some(scaffold);
                working.docs_commit = None;
                Ok(succeed(working, Step::Docs, message))
            }
            Err(e) => failure(working, Step::Docs, e),
        }
    }

    /// Generate the AI coding-rule policy, seeded with the built-in templates
    /// that match the stack plus the user's saved presets.
    pub async fn generate_policy(&self, project: &Project) -> Result<StepOutcome> {
        let mut working = begin(project, Step::Docs)?;
        let plan = working.upstream(Step::Plan, &working.plan, "plan")?.clone();
        let mut existing = rules::templates_for_stack(&plan.tech_stack);
        existing.merge(&working.settings.preset_rules());
        working.record(LogLevel::Info, Step::Docs, "Generating AI rules...", None);

        match self
            .generator
            .policy(&plan, &existing, &working.settings)
            .await
        {
            Ok(policy) => {
                working.policy = Some(policy);
                working.docs_commit = None;
                Ok(succeed(working, Step::Docs, "AI rules generated"))
            }
            Err(e) => failure(working, Step::Docs, e),
        }
    }

    /// Commit scaffold, docs and AI rules to the repository in one batch.
    pub async fn commit_docs(&self, project: &Project) -> Result<StepOutcome> {
        let mut working = begin(project, Step::Docs)?;
        let repo = working
            .upstream(Step::Repo, &working.repo_result, "repository")?
            .clone();
        let files = docs_bundle(&working)?;
        working.record(
            LogLevel::Info,
            Step::Docs,
            format!("Committing {} files to {}...", files.len(), repo.full_name),
            None,
        );

        match self
            .repo_host
            .commit_files(&repo.full_name, &repo.default_branch, &files, DOCS_COMMIT_MESSAGE)
            .await
        {
            Ok(sha) => {
                working.docs_commit = Some(CommitRecord {
                    sha,
                    message: DOCS_COMMIT_MESSAGE.to_string(),
                    files: files.into_iter().map(|f| f.path).collect(),
                    committed_at: Utc::now(),
                });
                Ok(succeed(
                    working,
                    Step::Docs,
                    "App scaffold and documentation committed to repository",
                ))
            }
            Err(e) => failure(working, Step::Docs, e),
        }
    }

    // -----------------------------------------------------------------------
    // Deploy
    // -----------------------------------------------------------------------

    pub async fn generate_deploy_config(&self, project: &Project) -> Result<StepOutcome> {
        let mut working = begin(project, Step::Deploy)?;
        let plan = working.upstream(Step::Plan, &working.plan, "plan")?;
        let request = DeployRequest {
            tech_stack: plan.tech_stack_summary(", "),
            project_type: DEFAULT_PROJECT_TYPE.to_string(),
            has_api: true,
        };
        working.record(
            LogLevel::Info,
            Step::Deploy,
            "Generating deploy configuration...",
            None,
        );

        match self
            .generator
            .deploy_config(&request, &working.settings)
            .await
        {
            Ok(config) => {
                working.deploy = Some(config);
                Ok(succeed(working, Step::Deploy, "Deploy configuration generated"))
            }
            Err(e) => failure(working, Step::Deploy, e),
        }
    }

    /// Commit `netlify.toml`, create the site and, for an unlinked site,
    /// upload the files directly. A site created by an earlier attempt is
    /// reused on retry.
    pub async fn launch_site(&self, project: &Project, name: Option<String>) -> Result<StepOutcome> {
        let mut working = begin(project, Step::Deploy)?;
        let deploy = working.deploy.clone().ok_or_else(|| ForgeError::MissingPayload {
            step: Step::Deploy.to_string(),
            payload: "a deploy configuration".into(),
        })?;
        let repo = working
            .upstream(Step::Repo, &working.repo_result, "repository")?
            .clone();
        let site_name = paths::slugify(name.as_deref().unwrap_or(repo.short_name()));
        if site_name.is_empty() {
            return Err(ForgeError::InvalidInput("site name must not be empty".into()));
        }

        let toml = FileEntry::new(NETLIFY_TOML, &deploy.netlify_toml);

        if working.deployment.is_none() {
            working.record(LogLevel::Info, Step::Deploy, "Committing netlify.toml...", None);
            if let Err(e) = self
                .repo_host
                .commit_files(
                    &repo.full_name,
                    &repo.default_branch,
                    std::slice::from_ref(&toml),
                    NETLIFY_COMMIT_MESSAGE,
                )
                .await
            {
                return failure(working, Step::Deploy, e);
            }

            let (build_command, publish_dir) = match &working.scaffold {
                Some(s) => (s.build_command.clone(), s.publish_dir.clone()),
                None => (
                    DEFAULT_BUILD_COMMAND.to_string(),
                    DEFAULT_PUBLISH_DIR.to_string(),
                ),
            };
            let params = SiteParams {
                name: site_name,
                repo_full_name: Some(repo.full_name.clone()),
                branch: repo.default_branch.clone(),
                build_command,
                publish_dir,
                deploy_key_id: None,
            };
            working.record(LogLevel::Info, Step::Deploy, "Creating Netlify site...", None);
            let (site, linked) = match self.create_site(&mut working, params).await {
                Ok(created) => created,
                Err(e) => return failure(working, Step::Deploy, e),
            };
            working.deployment = Some(Deployment {
                site_id: site.site_id,
                site_url: site.site_url,
                admin_url: site.admin_url,
                deploy_url: None,
                linked,
                env_keys: Vec::new(),
            });
            working.touch();
        } else {
            working.record(
                LogLevel::Info,
                Step::Deploy,
                "Reusing site from previous attempt",
                None,
            );
        }

        let Some(deployment) = working.deployment.clone() else {
            return Err(ForgeError::InvalidInput("site was not recorded".into()));
        };
        if !deployment.linked && deployment.deploy_url.is_none() {
            let mut files = site_files(&working);
            files.push(toml);
            working.record(
                LogLevel::Info,
                Step::Deploy,
                format!("Uploading {} files...", files.len()),
                None,
            );
            match self
                .deploy_host
                .deploy_files(&deployment.site_id, &files)
                .await
            {
                Ok(result) => {
                    if let Some(d) = working.deployment.as_mut() {
                        d.deploy_url = Some(result.deploy_url);
                    }
                }
                Err(e) => return failure(working, Step::Deploy, e),
            }
        }

        let message = format!("Site deployed: {}", deployment.site_url);
        Ok(succeed(working, Step::Deploy, message))
    }

    /// Linked site via a fresh deploy key, falling back to an unlinked site
    /// when any part of the link fails.
    async fn create_site(
        &self,
        working: &mut Project,
        params: SiteParams,
    ) -> std::result::Result<(SiteResult, bool), CollaboratorError> {
        if self.link_repository {
            match self.create_linked_site(&params).await {
                Ok(site) => return Ok((site, true)),
                Err(e) => {
                    tracing::warn!(
                        id = %working.id,
                        error = %e,
                        "repository link failed, falling back to direct deploy"
                    );
                    working.record(
                        LogLevel::Warn,
                        Step::Deploy,
                        "Repository link failed, deploying files directly",
                        Some(e.message),
                    );
                }
            }
        }
        let unlinked = SiteParams {
            repo_full_name: None,
            deploy_key_id: None,
            ..params
        };
        let site = self.deploy_host.create_site(&unlinked).await?;
        Ok((site, false))
    }

    async fn create_linked_site(
        &self,
        params: &SiteParams,
    ) -> std::result::Result<SiteResult, CollaboratorError> {
        let repo = params
            .repo_full_name
            .as_deref()
            .ok_or_else(|| CollaboratorError::new("no repository to link"))?;
        let key = self.deploy_host.create_deploy_key().await?;
        self.repo_host
            .add_deploy_key(repo, DEPLOY_KEY_TITLE, &key.public_key)
            .await?;
        let linked = SiteParams {
            deploy_key_id: Some(key.id),
            ..params.clone()
        };
        self.deploy_host.create_site(&linked).await
    }

    pub async fn configure_env(
        &self,
        project: &Project,
        vars: Vec<(String, String)>,
    ) -> Result<StepOutcome> {
        if let Some((key, _)) = vars.iter().find(|(k, _)| k.trim().is_empty()) {
            return Err(ForgeError::InvalidInput(format!(
                "environment variable key must not be blank: '{key}'"
            )));
        }
        let mut working = begin(project, Step::Deploy)?;
        let site_id = working
            .deployment
            .as_ref()
            .map(|d| d.site_id.clone())
            .ok_or_else(|| ForgeError::MissingPayload {
                step: Step::Deploy.to_string(),
                payload: "a launched site".into(),
            })?;
        working.record(
            LogLevel::Info,
            Step::Deploy,
            format!("Setting {} environment variables...", vars.len()),
            None,
        );

        match self.deploy_host.set_env_vars(&site_id, &vars).await {
            Ok(()) => {
                if let Some(d) = working.deployment.as_mut() {
                    for (key, _) in &vars {
                        if !d.env_keys.contains(key) {
                            d.env_keys.push(key.clone());
                        }
                    }
                }
                Ok(succeed(working, Step::Deploy, "Environment variables set"))
            }
            Err(e) => failure(working, Step::Deploy, e),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Guard on `step` being workable; an errored step is retried first.
fn begin(project: &Project, step: Step) -> Result<Project> {
    project.ensure_workable(step)?;
    if project.status(step) == StepStatus::Error {
        project.retry(step)
    } else {
        Ok(project.clone())
    }
}

fn succeed(mut project: Project, step: Step, message: impl Into<String>) -> StepOutcome {
    let message = message.into();
    tracing::info!(id = %project.id, %step, "{message}");
    project.record(LogLevel::Success, step, message, None);
    project.touch();
    StepOutcome::Ok(project)
}

fn failure(project: Project, step: Step, err: CollaboratorError) -> Result<StepOutcome> {
    tracing::error!(id = %project.id, %step, error = %err.message, "step failed");
    let mut failed = project.fail(step, &err.message)?;
    failed.record(LogLevel::Error, step, err.message.clone(), err.details);
    Ok(StepOutcome::Failed {
        project: failed,
        message: err.message,
    })
}

/// Scaffold files, then the four docs, then `AI_RULES.md`. A later file with
/// the same path replaces an earlier one.
fn docs_bundle(project: &Project) -> Result<Vec<FileEntry>> {
    let docs = project.docs.as_ref().ok_or_else(|| ForgeError::MissingPayload {
        step: Step::Docs.to_string(),
        payload: "generated docs".into(),
    })?;
    let mut files: Vec<FileEntry> = project
        .scaffold
        .as_ref()
        .map(|s| s.files.clone())
        .unwrap_or_default();
    files.extend(docs.files());
    if let Some(policy) = &project.policy {
        files.push(FileEntry::new(AI_RULES_MD, policy.to_markdown()));
    }
    Ok(dedupe_by_path(files))
}

/// Files uploaded to an unlinked site: everything that was committed.
fn site_files(project: &Project) -> Vec<FileEntry> {
    docs_bundle(project).unwrap_or_else(|_| {
        project
            .scaffold
            .as_ref()
            .map(|s| s.files.clone())
            .unwrap_or_default()
    })
}

fn dedupe_by_path(files: Vec<FileEntry>) -> Vec<FileEntry> {
    let mut out: Vec<FileEntry> = Vec::with_capacity(files.len());
    for file in files {
        if let Some(existing) = out.iter_mut().find(|f| f.path == file.path) {
            *existing = file;
        } else {
            out.push(file);
        }
    }
    out
}
