//! Errors raised by text-generation backends.

use thiserror::Error;

/// Why a backend produced no usable text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The request never got a response (connection, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend rejected the request for rate or quota reasons.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The credentials were missing or rejected.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The backend refused to generate content for this prompt.
    #[error("content blocked: {0}")]
    Content(String),

    /// The backend answered but the answer held no text.
    #[error("no response received")]
    EmptyResponse,

    /// Any other non-success HTTP status.
    #[error("backend returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The client could not be configured.
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

impl GenerationError {
    /// Returns true if re-issuing the same request might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Quota(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Auth(_) | Self::Content(_) | Self::EmptyResponse | Self::Config(_) => false,
        }
    }
}
