//! Error types for the relay server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors raised while handling a chat request.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The body could not be parsed as a conversation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The conversation parsed but cannot be relayed
    #[error("Invalid conversation: {0}")]
    InvalidInput(String),

    /// The upstream provider could not be reached or refused the request
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Create a new invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new configuration error.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) | RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::Provider(_) => StatusCode::BAD_GATEWAY,
            RelayError::Config(_) | RelayError::Io(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            RelayError::InvalidRequest(_) => "invalid_request",
            RelayError::InvalidInput(_) => "invalid_input",
            RelayError::Provider(_) => "provider_error",
            RelayError::Config(_) => "config_error",
            RelayError::Io(_) => "io_error",
            RelayError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.error_type(),
            "details": self.to_string(),
            "timestamp": chrono::Utc::now()
        }));
        (status, body).into_response()
    }
}

/// Failures talking to the completion provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider is not configured: {0}")]
    Config(String),

    #[error("request to provider failed: {0}")]
    Transport(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse provider chunk: {0}")]
    Parse(String),

    #[error("provider sent nothing for {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}
