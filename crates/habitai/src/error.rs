//! Error types for the HabitAI coach proxy
//!
//! Request-level failures are `ApiError`s and upstream failures are
//! `UpstreamError`s; this type covers startup and server lifecycle.

use thiserror::Error;

/// Main error type for coach proxy operations
#[derive(Error, Debug)]
pub enum CoachError {
    /// Configuration errors (bad config file, invalid port or URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors (bind, serve)
    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for coach proxy operations
pub type Result<T> = std::result::Result<T, CoachError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CoachError::Config("Invalid PORT 'x'".to_string()).to_string(),
            "Configuration error: Invalid PORT 'x'"
        );
        assert_eq!(
            CoachError::Server("Failed to bind".to_string()).to_string(),
            "Server error: Failed to bind"
        );
    }
}
