use devforge_core::collab::CollaboratorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{context} failed ({status}): {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
        body: String,
    },

    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("unexpected response from {context}: {reason}")]
    Decode { context: String, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for CollaboratorError {
    fn from(e: ClientError) -> Self {
        let details = match &e {
            ClientError::Api { body, .. } if !body.is_empty() => Some(body.clone()),
            _ => None,
        };
        CollaboratorError {
            message: e.to_string(),
            details,
        }
    }
}
