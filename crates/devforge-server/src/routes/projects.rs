use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use devforge_core::orchestrator::StepOutcome;
use devforge_core::settings::Settings;
use devforge_core::Project;

use crate::error::AppError;
use crate::routes::{settle, StepResponse};
use crate::state::AppState;

/// GET /api/projects: ids of every known project.
pub async fn list_projects(State(app): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(app.project_ids().await?))
}

/// POST /api/projects: fresh project seeded with the global settings.
pub async fn create_project(
    State(app): State<AppState>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let settings = app.global_settings().await?;
    let mut project = Project::create_initial();
    project.settings = settings;
    app.persist(None, &project).await?;
    tracing::info!(id = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(app.load(&id).await?))
}

/// PUT /api/projects/{id}: store an aggregate held by the client.
pub async fn put_project(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(project): Json<Project>,
) -> Result<Json<Project>, AppError> {
    if project.id != id {
        return Err(AppError::bad_request(format!(
            "body id '{}' does not match path id '{id}'",
            project.id
        )));
    }
    project.validate()?;
    let before = app.load(&id).await.ok();
    app.persist(before.as_ref(), &project).await?;
    Ok(Json(project))
}

/// PUT /api/projects/{id}/settings: replace the project's settings.
pub async fn put_settings(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(settings): Json<Settings>,
) -> Result<Json<StepResponse>, AppError> {
    let project = app.load(&id).await?;
    let next = project.with_settings(settings);
    settle(&app, &project, StepOutcome::Ok(next)).await
}
