use axum::extract::State;
use axum::Json;
use devforge_core::ForgeError;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/github/user: login behind the configured token.
pub async fn get_user(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let login = app
        .wizard
        .repo_host()
        .authenticated_user()
        .await
        .map_err(ForgeError::from)?;
    Ok(Json(serde_json::json!({ "login": login })))
}
