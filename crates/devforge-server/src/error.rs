use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use devforge_core::ForgeError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(ForgeError::InvalidInput(msg.into()).into())
    }

    /// Construct a 404 Not Found error for a project id.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self(ForgeError::ProjectNotFound(id.into()).into())
    }

    /// Wrap a `spawn_blocking` join failure.
    pub fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }
}

fn status_for(e: &ForgeError) -> StatusCode {
    match e {
        ForgeError::NotInitialized => StatusCode::BAD_REQUEST,
        ForgeError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
        ForgeError::InvalidStep(_)
        | ForgeError::InvalidStatus(_)
        | ForgeError::InvalidInput(_)
        | ForgeError::InvalidRepoName(_)
        | ForgeError::InvalidProvider(_) => StatusCode::BAD_REQUEST,
        ForgeError::InvalidTransition { .. } | ForgeError::MissingPayload { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ForgeError::Collaborator(_) => StatusCode::BAD_GATEWAY,
        ForgeError::Store(_) | ForgeError::Io(_) | ForgeError::Yaml(_) | ForgeError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .downcast_ref::<ForgeError>()
            .map(status_for)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devforge_core::collab::CollaboratorError;

    #[test]
    fn project_not_found_maps_to_404() {
        let response = AppError::not_found("abc").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_transition_maps_to_422() {
        let err = AppError(
            ForgeError::InvalidTransition {
                step: "plan".into(),
                from: "locked".into(),
                to: "approved".into(),
                reason: "step is locked".into(),
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn missing_payload_maps_to_422() {
        let err = AppError(
            ForgeError::MissingPayload {
                step: "docs".into(),
                payload: "a docs commit".into(),
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn invalid_repo_name_maps_to_400() {
        let err = AppError(ForgeError::InvalidRepoName("bad name".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn bad_request_constructor_maps_to_400() {
        let response = AppError::bad_request("id mismatch").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn collaborator_error_maps_to_502() {
        let err = AppError(ForgeError::from(CollaboratorError::new("GitHub is down")).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn foreign_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_body_is_json() {
        let response = AppError::not_found("abc").into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
