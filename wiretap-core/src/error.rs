use thiserror::Error;

/// Unified error type for Wiretap.
///
/// None of these ever surface to an HTTP client: the middleware logs them and
/// lets the exchange continue untouched.
#[derive(Error, Debug)]
pub enum WiretapError {
    #[error("Invalid path pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Format error: {0}")]
    Format(#[from] serde_json::Error),
}

impl WiretapError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        WiretapError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
