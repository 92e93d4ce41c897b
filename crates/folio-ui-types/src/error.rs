use thiserror::Error;

/// Failures decoding or encoding stream events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UiError {
    #[error("malformed event JSON: {message}")]
    Json { message: String },

    /// The `type` tag names an event this crate does not model.
    #[error("unknown event type `{event_type}`")]
    InvalidEventType { event_type: String },

    #[error("event is missing `{field}`")]
    MissingField { field: String },
}

impl UiError {
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

pub type UiResult<T> = Result<T, UiError>;
