//! Core message types shared by the relay and the chat client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message roles in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message typed by the visitor.
    User,
    /// A message generated by the model.
    Assistant,
}

impl Role {
    /// The lowercase wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Tag accepted for text parts. Only `"text"` deserializes into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextTag {
    #[serde(rename = "text")]
    Text,
}

/// A text fragment of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    /// Always `"text"`.
    #[serde(rename = "type")]
    pub tag: TextTag,
    /// The text content.
    pub text: String,
    /// Any other field the sender attached (for example `state`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextPart {
    /// Create a new text part.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            tag: TextTag::Text,
            text: text.into(),
            extra: Map::new(),
        }
    }
}

/// One content fragment of a message.
///
/// Parts that are not text are kept verbatim so they survive being forwarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// A text fragment.
    Text(TextPart),
    /// Any other fragment, kept as raw JSON.
    Other(Value),
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(TextPart::new(text))
    }

    /// Returns the text if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(part) => Some(&part.text),
            Part::Other(_) => None,
        }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier, stable for the session.
    pub id: String,
    /// Who authored the message.
    pub role: Role,
    /// Ordered content fragments.
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Opaque metadata attached by the sender (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Message {
    /// Create a user message holding a single text part.
    pub fn new_user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Create an assistant message with no parts yet.
    pub fn new_assistant(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            parts: Vec::new(),
            metadata: None,
        }
    }

    /// Concatenation of all text parts, in order.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }

    /// Iterate over the text parts only.
    pub fn text_parts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(Part::as_text)
    }

    /// Append a delta to the trailing text part, creating one if the
    /// message does not end with a text part.
    pub fn append_text(&mut self, delta: &str) {
        match self.parts.last_mut() {
            Some(Part::Text(part)) => part.text.push_str(delta),
            _ => self.parts.push(Part::text(delta)),
        }
    }

    /// Start a new, empty text part.
    pub fn begin_text_part(&mut self) {
        self.parts.push(Part::text(""));
    }
}

/// Generate a message id of the form `msg_<16 hex chars>`.
pub fn generate_message_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("msg_{}", &raw[..16])
}

/// Request body accepted by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Chat id chosen by the client (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The full conversation, newest message last.
    pub messages: Vec<Message>,
    /// What caused the request, e.g. `submit-message` (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl ChatRequest {
    /// Create a request carrying the given conversation.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            id: None,
            messages,
            trigger: Some("submit-message".to_string()),
        }
    }

    /// Set the chat id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
