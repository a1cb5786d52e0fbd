#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile not found: @{namespace}/{name}")]
    NotFound { namespace: String, name: String },

    #[error("missing environment variable '{0}' (no default given)")]
    MissingVariable(String),

    #[error("circular profile reference detected: {0}")]
    CircularReference(String),

    #[error("unknown parameter '{param}' for profile @{namespace}/{name} (closed parameter schema)")]
    UnknownParameter {
        namespace: String,
        name: String,
        param: String,
    },

    #[error("malformed profile document: {0}")]
    Malformed(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
