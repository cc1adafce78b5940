use thiserror::Error;

/// Failures talking to the language model.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum LlmError {
    #[error("No API key configured")]
    MissingCredential,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// True when the provider rejected the credential.
    pub fn is_authentication(&self) -> bool {
        matches!(self, LlmError::Authentication(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors can carry the request URL but never headers.
        LlmError::Transport(err.to_string())
    }
}
