//! Event types for the UI message stream.
//!
//! The relay emits these as SSE `data:` payloads, one JSON object per event,
//! and finishes the body with a literal `[DONE]` marker.

use serde::{Deserialize, Serialize};

use crate::error::{UiError, UiResult};

/// Data payload that terminates the stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Header announcing the stream protocol version to clients.
pub const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";

/// Protocol version sent in [`UI_MESSAGE_STREAM_HEADER`].
pub const UI_MESSAGE_STREAM_VERSION: &str = "v1";

/// Event marking the start of an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartEvent {
    /// The id the assistant message should use (optional).
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Event opening a text part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStartEvent {
    /// The id of the text part.
    pub id: String,
}

/// Event carrying a piece of generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDeltaEvent {
    /// The id of the text part the delta belongs to.
    pub id: String,
    /// The text to append.
    pub delta: String,
}

/// Event closing a text part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEndEvent {
    /// The id of the text part.
    pub id: String,
}

/// Event reporting that generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Human readable description of the failure.
    #[serde(rename = "errorText")]
    pub error_text: String,
}

/// An event in the UI message stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// Start of an assistant message.
    Start(StartEvent),
    /// Start of a generation step.
    StartStep,
    /// Start of a text part.
    TextStart(TextStartEvent),
    /// Incremental text.
    TextDelta(TextDeltaEvent),
    /// End of a text part.
    TextEnd(TextEndEvent),
    /// End of a generation step.
    FinishStep,
    /// Successful completion of the message.
    Finish,
    /// Generation failed; no further events follow.
    Error(ErrorEvent),
}

impl Event {
    /// The wire name of the event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Start(_) => "start",
            Event::StartStep => "start-step",
            Event::TextStart(_) => "text-start",
            Event::TextDelta(_) => "text-delta",
            Event::TextEnd(_) => "text-end",
            Event::FinishStep => "finish-step",
            Event::Finish => "finish",
            Event::Error(_) => "error",
        }
    }

    /// Whether the event ends the message (completion or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Finish | Event::Error(_))
    }

    /// Create a `start` event.
    pub fn start(message_id: impl Into<String>) -> Self {
        Event::Start(StartEvent {
            message_id: Some(message_id.into()),
        })
    }

    /// Create a `text-start` event.
    pub fn text_start(id: impl Into<String>) -> Self {
        Event::TextStart(TextStartEvent { id: id.into() })
    }

    /// Create a `text-delta` event.
    pub fn text_delta(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Event::TextDelta(TextDeltaEvent {
            id: id.into(),
            delta: delta.into(),
        })
    }

    /// Create a `text-end` event.
    pub fn text_end(id: impl Into<String>) -> Self {
        Event::TextEnd(TextEndEvent { id: id.into() })
    }

    /// Create an `error` event.
    pub fn error(error_text: impl Into<String>) -> Self {
        Event::Error(ErrorEvent {
            error_text: error_text.into(),
        })
    }

    /// Parse an SSE `data:` payload.
    ///
    /// Returns `Ok(None)` for the `[DONE]` marker.
    pub fn from_sse_data(data: &str) -> UiResult<Option<Self>> {
        let data = data.trim();
        if data == DONE_MARKER {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| UiError::json(format!("Invalid event JSON: {}", e)))?;

        let event_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| UiError::missing_field("type"))?
            .to_string();

        serde_json::from_value::<Event>(value).map(Some).map_err(|e| {
            if e.to_string().contains("unknown variant") {
                UiError::InvalidEventType { event_type }
            } else {
                UiError::json(format!("Failed to parse '{}' event: {}", event_type, e))
            }
        })
    }

    /// Serialize the event into an SSE `data:` payload.
    pub fn to_sse_data(&self) -> UiResult<String> {
        serde_json::to_string(self)
            .map_err(|e| UiError::json(format!("Failed to serialize event: {}", e)))
    }
}
