use std::path::PathBuf;

use axum::extract::{Query, State};
use axum::Json;
use devforge_core::scan;
use devforge_core::settings::RepoSource;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct ScanQuery {
    /// `owner/name` of a GitHub repository.
    #[serde(default)]
    pub github: Option<String>,
    /// Local directory.
    #[serde(default)]
    pub local: Option<PathBuf>,
    /// Fall back to this project's connected source.
    #[serde(default)]
    pub project: Option<String>,
    /// Read this file instead of listing.
    #[serde(default)]
    pub file: Option<String>,
}

/// Explicit query source first, then the project's, then the global one.
async fn resolve_source(app: &AppState, query: &ScanQuery) -> Result<RepoSource, AppError> {
    if let Some(full_name) = &query.github {
        return Ok(RepoSource::Github {
            full_name: full_name.clone(),
        });
    }
    if let Some(path) = &query.local {
        return Ok(RepoSource::Local { path: path.clone() });
    }
    if let Some(id) = &query.project {
        if let Some(source) = app.load(id).await?.settings.repo_source {
            return Ok(source);
        }
    }
    app.global_settings()
        .await?
        .repo_source
        .ok_or_else(|| AppError::bad_request("no repository source connected"))
}

/// GET /api/scan: list a repository or read one of its files.
pub async fn scan_repo(
    State(app): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let source = resolve_source(&app, &query).await?;

    let result = match (source, query.file) {
        (RepoSource::Local { path }, None) => {
            let report = tokio::task::spawn_blocking(move || scan::scan_local(&path))
                .await
                .map_err(AppError::join)??;
            serde_json::to_value(report)?
        }
        (RepoSource::Local { path }, Some(file)) => {
            let name = file.clone();
            let content = tokio::task::spawn_blocking(move || scan::read_local_file(&path, &name))
                .await
                .map_err(AppError::join)??;
            serde_json::json!({ "path": file, "content": content })
        }
        (source, None) => {
            let report = scan::scan(&source, &**app.wizard.repo_host()).await?;
            serde_json::to_value(report)?
        }
        (source, Some(file)) => {
            let content = scan::read_file(&source, &**app.wizard.repo_host(), &file).await?;
            serde_json::json!({ "path": file, "content": content })
        }
    };
    Ok(Json(result))
}
