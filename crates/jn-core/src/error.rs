use std::fmt;

/// Category of a core-level error. Lets callers decide retry/abort policy
/// without string-matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed address, override, or compression layer (§4.B).
    Address,
    /// I/O failure other than a broken pipe.
    Io,
    /// Malformed NDJSON input.
    Format,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Address => f.write_str("address"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Format => f.write_str("format"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("address: {0}")]
    Address(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("format: {0}")]
    Format(String),
}

impl CoreError {
    pub fn address(msg: impl Into<String>) -> Self {
        CoreError::Address(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Address(_) => ErrorKind::Address,
            CoreError::Io(_) => ErrorKind::Io,
            CoreError::Format(_) => ErrorKind::Format,
        }
    }

    /// True for the broken-pipe case that §4.A/§5 treat as graceful
    /// termination rather than a fatal error.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, CoreError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}
