use std::time::Duration;

use thiserror::Error;

/// Failures of a single upstream completion attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// The wall-clock deadline elapsed; the in-flight request was dropped
    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with a non-success status
    #[error("Upstream API returned {status}")]
    Http { status: u16, body: String },

    /// A success body without the expected completion field
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Connection-level failure before any status was received
    #[error("Upstream request failed: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Timeout(_) | UpstreamError::Http { .. } | UpstreamError::Transport(_) => {
                true
            }
            UpstreamError::MalformedResponse(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Timeout(_))
    }

    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Http { .. } => "http",
            UpstreamError::MalformedResponse(_) => "malformed_response",
            UpstreamError::Transport(_) => "transport",
        }
    }
}
