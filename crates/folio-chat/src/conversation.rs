use folio_ui_types::{Message, Role};

/// Ordered, append-only message history.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index.
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Message> {
        self.messages.get_mut(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_role(&self) -> Option<Role> {
        self.messages.last().map(|m| m.role)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Copy of the history, as sent to the relay.
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        assert_eq!(conversation.push(Message::new_user("u1", "Hi")), 0);
        assert_eq!(conversation.push(Message::new_assistant("a1")), 1);
        assert_eq!(conversation.push(Message::new_user("u2", "Hi")), 2);

        let ids: Vec<&str> = conversation.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "a1", "u2"]);
        assert_eq!(conversation.last_role(), Some(Role::User));
        assert_eq!(conversation.to_vec().len(), 3);
    }
}
