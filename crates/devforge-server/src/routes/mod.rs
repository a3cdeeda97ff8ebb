pub mod events;
pub mod github;
pub mod projects;
pub mod scan;
pub mod settings;
pub mod steps;

use axum::Json;
use devforge_core::orchestrator::StepOutcome;
use devforge_core::Project;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Body of every wizard mutation. `error` is set when a collaborator failed
/// and the step was moved to `error`; the request itself still succeeds.
#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub project: Project,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Persist the outcome of a controller and shape the response.
pub(crate) async fn settle(
    app: &AppState,
    before: &Project,
    outcome: StepOutcome,
) -> Result<Json<StepResponse>, AppError> {
    let error = outcome.error().map(str::to_string);
    let project = outcome.into_project();
    app.persist(Some(before), &project).await?;
    Ok(Json(StepResponse { project, error }))
}
