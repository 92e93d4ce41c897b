//! Conversion of the UI conversation into the provider's chat schema.

use folio_ui_types::{ChatRequest, Message, Role};

use crate::error::{RelayError, Result};
use crate::provider::ProviderMessage;

/// Check that a parsed request can be relayed.
pub fn validate_request(request: &ChatRequest) -> Result<()> {
    let last = request
        .messages
        .last()
        .ok_or_else(|| RelayError::invalid_input("messages must not be empty"))?;

    if last.role != Role::User {
        return Err(RelayError::invalid_input(format!(
            "last message must come from the user, got '{}'",
            last.role.as_str()
        )));
    }

    Ok(())
}

/// Map UI messages to `{role, content}` pairs, prefixed with the system prompt.
///
/// Only text parts are forwarded. Assistant messages without any text (for
/// example a reply the visitor interrupted before the first token) are left out.
pub fn convert_to_model_messages(system_prompt: &str, messages: &[Message]) -> Vec<ProviderMessage> {
    let mut converted = Vec::with_capacity(messages.len() + 1);
    converted.push(ProviderMessage::system(system_prompt));

    for message in messages {
        let content = message.text();
        match message.role {
            Role::User => converted.push(ProviderMessage::user(content)),
            Role::Assistant if content.is_empty() => {
                log::debug!("Skipping empty assistant message {}", message.id);
            }
            Role::Assistant => converted.push(ProviderMessage::assistant(content)),
        }
    }

    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderRole;
    use folio_ui_types::Part;
    use serde_json::json;

    fn conversation(messages: Vec<Message>) -> ChatRequest {
        ChatRequest::new(messages)
    }

    #[test]
    fn test_system_prompt_is_prepended() {
        let converted =
            convert_to_model_messages("persona", &[Message::new_user("u1", "Bonjour")]);

        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0], ProviderMessage::system("persona"));
        assert_eq!(converted[1], ProviderMessage::user("Bonjour"));
    }

    #[test]
    fn test_text_parts_are_concatenated_and_other_parts_dropped() {
        let mut message = Message::new_user("u1", "Tell me ");
        message.parts.push(Part::Other(json!({ "type": "file", "url": "x.png" })));
        message.parts.push(Part::text("about you"));

        let converted = convert_to_model_messages("p", &[message]);
        assert_eq!(converted[1].content, "Tell me about you");
    }

    fn assistant(id: &str, text: &str) -> Message {
        let mut message = Message::new_assistant(id);
        message.append_text(text);
        message
    }

    #[test]
    fn test_roles_and_order_are_preserved() {
        let messages = vec![
            Message::new_user("u1", "Hi"),
            assistant("a1", "Hello!"),
            Message::new_user("u2", "Projects?"),
        ];

        let roles: Vec<ProviderRole> = convert_to_model_messages("p", &messages)
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![
                ProviderRole::System,
                ProviderRole::User,
                ProviderRole::Assistant,
                ProviderRole::User
            ]
        );
    }

    #[test]
    fn test_empty_assistant_messages_are_skipped() {
        let messages = vec![
            Message::new_user("u1", "Hi"),
            Message::new_assistant("a1"),
            Message::new_user("u2", "Still there?"),
        ];

        let converted = convert_to_model_messages("p", &messages);
        assert_eq!(converted.len(), 3);
        assert!(converted.iter().all(|m| m.role != ProviderRole::Assistant));
    }

    #[test]
    fn test_validate_accepts_trailing_user_message() {
        let request = conversation(vec![
            Message::new_user("u1", "Hi"),
            assistant("a1", "Hello"),
            Message::new_user("u2", "Blog?"),
        ]);
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_conversation() {
        let err = validate_request(&conversation(Vec::new())).unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_rejects_trailing_assistant_message() {
        let request = conversation(vec![
            Message::new_user("u1", "Hi"),
            assistant("a1", "Hello"),
        ]);
        let err = validate_request(&request).unwrap_err();
        assert!(err.to_string().contains("assistant"));
    }
}
