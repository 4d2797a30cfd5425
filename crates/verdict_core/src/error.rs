use thiserror::Error;

/// Failure of a call against the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response reached the client (connect, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),
    /// The backend answered with a non-success status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    /// Rejected input, either locally or by the backend (400/422).
    #[error("validation failed: {0}")]
    Validation(String),
    /// A response arrived but its body could not be understood.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Only transport failures may be replaced by fallback data.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Message suitable for showing to a user; server text is passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } | ApiError::Validation(message) => message.clone(),
            ApiError::NotFound(_) => "job not found".to_string(),
            other => other.to_string(),
        }
    }
}
