use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use devforge_core::orchestrator::{self, StepOutcome};
use devforge_core::payload::{GeneratedDocs, IdeaInput, ProjectPlan, RepoConfig};
use devforge_core::types::Step;

use crate::error::AppError;
use crate::routes::{settle, StepResponse};
use crate::state::AppState;

type StepResult = Result<Json<StepResponse>, AppError>;

// ---------------------------------------------------------------------------
// Idea / plan
// ---------------------------------------------------------------------------

/// POST /api/projects/{id}/idea: record the idea and generate the plan.
pub async fn submit_idea(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(idea): Json<IdeaInput>,
) -> StepResult {
    let project = app.load(&id).await?;
    let outcome = app.wizard.submit_idea(&project, idea).await?;
    settle(&app, &project, outcome).await
}

/// POST /api/projects/{id}/plan/generate
pub async fn generate_plan(State(app): State<AppState>, Path(id): Path<String>) -> StepResult {
    let project = app.load(&id).await?;
    let outcome = app.wizard.generate_plan(&project).await?;
    settle(&app, &project, outcome).await
}

/// PUT /api/projects/{id}/plan: replace the plan while it is under review.
pub async fn put_plan(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(plan): Json<ProjectPlan>,
) -> StepResult {
    let project = app.load(&id).await?;
    let next = orchestrator::edit_plan(&project, plan)?;
    settle(&app, &project, StepOutcome::Ok(next)).await
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct CreateRepoBody {
    /// Defaults to a slug of the plan's first sentence.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub owner: String,
}

/// POST /api/projects/{id}/repo
pub async fn create_repo(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CreateRepoBody>,
) -> StepResult {
    let project = app.load(&id).await?;
    let plan = project.plan.as_ref();
    let name = match (body.name, plan) {
        (Some(name), _) => name,
        (None, Some(plan)) => orchestrator::suggested_repo_name(plan),
        (None, None) => String::new(),
    };
    let description = body
        .description
        .or_else(|| plan.map(|p| p.headline().to_string()))
        .unwrap_or_default();
    let config = RepoConfig {
        name,
        description,
        is_private: body.is_private,
        owner: body.owner,
    };
    let outcome = app.wizard.create_repository(&project, config).await?;
    settle(&app, &project, outcome).await
}

// ---------------------------------------------------------------------------
// Docs
// ---------------------------------------------------------------------------

/// POST /api/projects/{id}/docs/generate
pub async fn generate_docs(State(app): State<AppState>, Path(id): Path<String>) -> StepResult {
    let project = app.load(&id).await?;
    let outcome = app.wizard.generate_docs(&project).await?;
    settle(&app, &project, outcome).await
}

/// POST /api/projects/{id}/docs/scaffold
pub async fn generate_scaffold(State(app): State<AppState>, Path(id): Path<String>) -> StepResult {
    let project = app.load(&id).await?;
    let outcome = app.wizard.generate_scaffold(&project).await?;
    settle(&app, &project, outcome).await
}

/// POST /api/projects/{id}/docs/policy
pub async fn generate_policy(State(app): State<AppState>, Path(id): Path<String>) -> StepResult {
    let project = app.load(&id).await?;
    let outcome = app.wizard.generate_policy(&project).await?;
    settle(&app, &project, outcome).await
}

/// POST /api/projects/{id}/docs/commit
pub async fn commit_docs(State(app): State<AppState>, Path(id): Path<String>) -> StepResult {
    let project = app.load(&id).await?;
    let outcome = app.wizard.commit_docs(&project).await?;
    settle(&app, &project, outcome).await
}

/// PUT /api/projects/{id}/docs
pub async fn put_docs(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(docs): Json<GeneratedDocs>,
) -> StepResult {
    let project = app.load(&id).await?;
    let next = orchestrator::edit_docs(&project, docs)?;
    settle(&app, &project, StepOutcome::Ok(next)).await
}

// ---------------------------------------------------------------------------
// Deploy
// ---------------------------------------------------------------------------

/// POST /api/projects/{id}/deploy/generate
pub async fn generate_deploy(State(app): State<AppState>, Path(id): Path<String>) -> StepResult {
    let project = app.load(&id).await?;
    let outcome = app.wizard.generate_deploy_config(&project).await?;
    settle(&app, &project, outcome).await
}

#[derive(serde::Deserialize)]
pub struct LaunchBody {
    #[serde(default)]
    pub name: Option<String>,
}

/// POST /api/projects/{id}/deploy/launch
pub async fn launch(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LaunchBody>,
) -> StepResult {
    let project = app.load(&id).await?;
    let outcome = app.wizard.launch_site(&project, body.name).await?;
    settle(&app, &project, outcome).await
}

#[derive(serde::Deserialize)]
pub struct EnvBody {
    pub vars: BTreeMap<String, String>,
}

/// POST /api/projects/{id}/deploy/env
pub async fn configure_env(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EnvBody>,
) -> StepResult {
    let project = app.load(&id).await?;
    let vars = body.vars.into_iter().collect();
    let outcome = app.wizard.configure_env(&project, vars).await?;
    settle(&app, &project, outcome).await
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// POST /api/projects/{id}/steps/{step}/approve
pub async fn approve_step(
    State(app): State<AppState>,
    Path((id, step)): Path<(String, String)>,
) -> StepResult {
    let step: Step = step.parse()?;
    let project = app.load(&id).await?;
    let next = orchestrator::approve(&project, step)?;
    settle(&app, &project, StepOutcome::Ok(next)).await
}

/// POST /api/projects/{id}/steps/{step}/retry
pub async fn retry_step(
    State(app): State<AppState>,
    Path((id, step)): Path<(String, String)>,
) -> StepResult {
    let step: Step = step.parse()?;
    let project = app.load(&id).await?;
    let next = orchestrator::retry(&project, step)?;
    settle(&app, &project, StepOutcome::Ok(next)).await
}

#[derive(serde::Deserialize)]
pub struct FailBody {
    pub message: String,
}

/// POST /api/projects/{id}/steps/{step}/fail
pub async fn fail_step(
    State(app): State<AppState>,
    Path((id, step)): Path<(String, String)>,
    Json(body): Json<FailBody>,
) -> StepResult {
    let step: Step = step.parse()?;
    let project = app.load(&id).await?;
    let next = orchestrator::fail(&project, step, &body.message)?;
    settle(&app, &project, StepOutcome::Ok(next)).await
}

/// POST /api/projects/{id}/back
pub async fn go_back(State(app): State<AppState>, Path(id): Path<String>) -> StepResult {
    let project = app.load(&id).await?;
    let next = orchestrator::go_back(&project)?;
    settle(&app, &project, StepOutcome::Ok(next)).await
}
