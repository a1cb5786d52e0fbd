#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("no plugin found for protocol '{0}'")]
    NoProtocolPlugin(String),

    #[error("no plugin found for compression layer '{0}'")]
    NoCompressionPlugin(String),

    #[error("no format plugin matched '{source}' for {mode} mode")]
    NoFormatPlugin { source: String, mode: &'static str },

    #[error("address requires a format but none could be determined: {0}")]
    AmbiguousFormat(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("spawning stage '{command}': {source}")]
    Spawn { command: String, source: std::io::Error },

    #[error("waiting on stage '{command}': {source}")]
    Wait { command: String, source: std::io::Error },

    #[error("wiring stdio between stages: {0}")]
    Wiring(std::io::Error),
}
