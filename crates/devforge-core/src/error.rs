use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("not initialized: run 'devforge init'")]
    NotInitialized,

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("invalid step: {0}")]
    InvalidStep(String),

    #[error("invalid step status: {0}")]
    InvalidStatus(String),

    #[error("invalid transition for step '{step}' from {from} to {to}: {reason}")]
    InvalidTransition {
        step: String,
        from: String,
        to: String,
        reason: String,
    },

    #[error("step '{step}' requires {payload} before it can proceed")]
    MissingPayload { step: String, payload: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid repository name '{0}': use letters, digits, '.', '-' or '_' (max 100)")]
    InvalidRepoName(String),

    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    #[error(transparent)]
    Collaborator(#[from] crate::collab::CollaboratorError),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
