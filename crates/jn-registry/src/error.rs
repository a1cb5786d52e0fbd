#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache: {0}")]
    Cache(String),

    #[error("no plugin found for role '{role}' mode '{mode}'")]
    NoMatch { role: String, mode: String },
}
