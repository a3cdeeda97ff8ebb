use axum::extract::State;
use axum::Json;
use devforge_core::settings::Settings;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/settings: settings applied to new projects.
pub async fn get_settings(State(app): State<AppState>) -> Result<Json<Settings>, AppError> {
    Ok(Json(app.global_settings().await?))
}

/// PUT /api/settings
pub async fn put_settings(
    State(app): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<serde_json::Value>, AppError> {
    let persisted = app.set_global_settings(settings.clone()).await?;
    Ok(Json(serde_json::json!({
        "settings": settings,
        "persisted": persisted,
    })))
}
