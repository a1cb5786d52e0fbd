#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("parse error in '{expression}': {message}")]
    Parse { expression: String, message: String },

    #[error("unsupported feature '{feature}' in '{expression}': {suggestion}")]
    UnsupportedFeature {
        expression: String,
        feature: String,
        suggestion: String,
    },

    #[error("expression exceeds maximum nesting depth of {max_depth} in '{expression}'")]
    RecursionDepthExceeded { expression: String, max_depth: usize },
}
