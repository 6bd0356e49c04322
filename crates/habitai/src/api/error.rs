//! HTTP error payloads for the coach API
//!
//! - Validation errors: 400 `{error}`
//! - Configuration errors: 500 `{error, message}`
//! - Upstream failures that reach the caller: 500 `{error, message}`
//! - Unknown routes: 404 `{error: "Not found", message}`
//! - Anything else: 500 `{error: "Internal server error", message}`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::api::conversation::ConversationIdError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request field
    #[error("{0}")]
    Validation(String),

    /// The server is missing configuration needed to serve the request
    #[error("{error}: {message}")]
    Configuration { error: String, message: String },

    /// The upstream model could not answer and no substitute exists
    #[error("{error}: {message}")]
    Upstream { error: String, message: String },

    #[error("Endpoint {method} {path} not found")]
    NotFound { method: String, path: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Configuration { .. } | ApiError::Upstream { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Credential missing for the upstream API
    pub fn missing_credential(api_key_env: &str) -> Self {
        ApiError::Configuration {
            error: "API key not configured".to_string(),
            message: format!("Set the {api_key_env} environment variable and restart the server"),
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Validation(error) => serde_json::json!({ "error": error }),
            ApiError::Configuration { error, message } | ApiError::Upstream { error, message } => {
                serde_json::json!({ "error": error, "message": message })
            }
            ApiError::NotFound { .. } => {
                serde_json::json!({ "error": "Not found", "message": self.to_string() })
            }
            ApiError::Internal(message) => {
                serde_json::json!({ "error": "Internal server error", "message": message })
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, "Request failed: {self}");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<ConversationIdError> for ApiError {
    fn from(e: ConversationIdError) -> Self {
        ApiError::Validation(e.to_string())
    }
}
