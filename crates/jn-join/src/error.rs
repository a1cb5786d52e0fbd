#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("join key field '{0}' is missing or not a plain field path")]
    BadKeySpec(String),

    #[error(
        "right source for join exceeded the configured memory limit of {limit} bytes \
         (buffered {buffered} bytes); reduce the right source or raise the limit"
    )]
    RightSourceOverflow { limit: usize, buffered: usize },

    #[error("invalid aggregation spec '{0}': expected 'name: fn' or 'name: fn(field)'")]
    BadAggSpec(String),

    #[error("condition expression error: {0}")]
    Condition(#[from] jn_expr::ExprError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("format: {0}")]
    Format(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("source '{label}' failed: {source}")]
    SourceFailed { label: String, source: std::io::Error },

    #[error("source '{label}' produced malformed NDJSON: {message}")]
    MalformedRecord { label: String, message: String },
}
