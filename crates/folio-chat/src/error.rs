//! Error types for the chat client.

use folio_ui_types::UiError;
use thiserror::Error;

/// Failures while talking to the relay.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The connection failed or was cut mid-stream
    #[error("transport error: {0}")]
    Transport(String),

    /// The relay refused the request before streaming
    #[error("relay returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The relay sent something that is not a UI stream event
    #[error("protocol error: {0}")]
    Protocol(#[from] UiError),
}

impl ChatError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
