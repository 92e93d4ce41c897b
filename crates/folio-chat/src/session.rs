//! The chat session: conversation, stream status and input buffer.
//!
//! A session is owned by a single task. `submit` produces the request to
//! send; the events of the reply are then fed back through `apply_event`
//! (or `consume`, which drives a whole [`DeltaStream`]).

use futures_util::StreamExt;

use folio_ui_types::{generate_message_id, ChatRequest, Event, Message, Role};

use crate::conversation::Conversation;
use crate::error::ChatError;
use crate::status::StreamStatus;
use crate::stream::DeltaStream;
use crate::suggestions::{Suggestion, GREETING, HEADLINE, INPUT_PLACEHOLDER, SUGGESTIONS};

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The text was empty or only whitespace.
    EmptyInput,
    /// A reply is still being requested or streamed.
    Busy,
}

/// Result of `submit` / `suggest`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The message was appended; send this request to the relay.
    Accepted(ChatRequest),
    /// Nothing changed.
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

/// What `apply_event` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// The session was not waiting for a reply.
    Ignored,
}

/// A message as displayed: only its text parts, one paragraph each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub id: String,
    pub role: Role,
    pub paragraphs: Vec<String>,
}

/// What to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// No message yet: greeting, input and suggestions.
    Landing {
        greeting: &'static str,
        headline: &'static str,
        placeholder: &'static str,
        input: String,
        suggestions: Vec<&'static str>,
    },
    /// History with the input below it.
    Conversation {
        messages: Vec<RenderedMessage>,
        typing_indicator: bool,
        input: String,
        placeholder: &'static str,
        submit_enabled: bool,
        error: Option<String>,
    },
}

#[derive(Debug)]
pub struct ChatSession {
    chat_id: String,
    conversation: Conversation,
    status: StreamStatus,
    input: String,
    /// Index of the assistant message being streamed into.
    assistant: Option<usize>,
    /// The last text part was closed by `text-end`.
    part_closed: bool,
    last_error: Option<String>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let raw = generate_message_id();
        Self {
            chat_id: format!("chat_{}", &raw["msg_".len()..]),
            conversation: Conversation::default(),
            status: StreamStatus::Idle,
            input: String::new(),
            assistant: None,
            part_closed: false,
            last_error: None,
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// The submit control is disabled while a reply is in progress.
    pub fn can_submit(&self) -> bool {
        !self.status.is_busy()
    }

    pub fn suggestions(&self) -> &'static [Suggestion] {
        &SUGGESTIONS
    }

    fn transition(&mut self, next: StreamStatus) {
        if self.status.can_transition_to(next) {
            log::debug!("Stream status {} -> {}", self.status, next);
            self.status = next;
        } else {
            log::warn!("Ignoring illegal status change {} -> {}", self.status, next);
        }
    }

    /// Append a user message and start a new exchange.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let outcome = self.push_user_message(text);
        if outcome.is_accepted() {
            self.input.clear();
        }
        outcome
    }

    /// Submit whatever is in the input buffer.
    pub fn submit_input(&mut self) -> SubmitOutcome {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// Send a suggestion's label as the user's message.
    ///
    /// Same rules as `submit`, but a half-typed draft in the input is kept.
    pub fn suggest(&mut self, label: &str) -> SubmitOutcome {
        self.push_user_message(label)
    }

    fn push_user_message(&mut self, text: &str) -> SubmitOutcome {
        if self.status.is_busy() {
            return SubmitOutcome::Rejected(RejectReason::Busy);
        }
        if text.trim().is_empty() {
            return SubmitOutcome::Rejected(RejectReason::EmptyInput);
        }

        self.conversation
            .push(Message::new_user(generate_message_id(), text));
        self.transition(StreamStatus::Submitted);
        self.assistant = None;
        self.part_closed = false;
        self.last_error = None;

        SubmitOutcome::Accepted(
            ChatRequest::new(self.conversation.to_vec()).with_id(self.chat_id.clone()),
        )
    }

    /// Create the assistant message on the first event of a reply.
    fn ensure_assistant(&mut self, message_id: Option<&str>) -> usize {
        if let Some(index) = self.assistant {
            return index;
        }
        let id = message_id
            .map(str::to_string)
            .unwrap_or_else(generate_message_id);
        let index = self.conversation.push(Message::new_assistant(id));
        self.assistant = Some(index);
        self.transition(StreamStatus::Streaming);
        index
    }

    fn assistant_message(&mut self) -> Option<&mut Message> {
        let index = self.assistant?;
        self.conversation.get_mut(index)
    }

    /// Apply one event of the reply.
    ///
    /// Events are ignored unless a reply is in progress, so nothing lands
    /// after completion, failure or `abort`.
    pub fn apply_event(&mut self, event: Event) -> EventOutcome {
        if !self.status.is_busy() {
            log::debug!(
                "Ignoring {} event while {}",
                event.event_type(),
                self.status
            );
            return EventOutcome::Ignored;
        }

        match event {
            Event::Start(start) => {
                self.ensure_assistant(start.message_id.as_deref());
            }
            Event::StartStep | Event::FinishStep => {
                self.ensure_assistant(None);
            }
            Event::TextStart(_) => {
                self.ensure_assistant(None);
                let closed = std::mem::replace(&mut self.part_closed, false);
                if let Some(message) = self.assistant_message() {
                    if closed || message.parts.is_empty() {
                        message.begin_text_part();
                    }
                }
            }
            Event::TextDelta(delta) => {
                self.ensure_assistant(None);
                if let Some(message) = self.assistant_message() {
                    message.append_text(&delta.delta);
                }
            }
            Event::TextEnd(_) => {
                self.ensure_assistant(None);
                self.part_closed = true;
            }
            Event::Finish => {
                self.assistant = None;
                self.transition(StreamStatus::Idle);
            }
            Event::Error(error) => {
                log::warn!("Reply failed: {}", error.error_text);
                self.fail(error.error_text);
            }
        }

        EventOutcome::Applied
    }

    /// Mark the exchange as failed. The partial reply stays in the history.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.status.is_busy() {
            return;
        }
        self.assistant = None;
        self.last_error = Some(reason.into());
        self.transition(StreamStatus::Error);
    }

    /// Stop the reply in progress. The partial reply is kept, unfinished.
    ///
    /// Returns `false` when there was nothing to abort.
    pub fn abort(&mut self) -> bool {
        if !self.status.is_busy() {
            return false;
        }
        log::info!("Aborting reply after user request");
        self.fail("aborted");
        true
    }

    /// Apply every event of `stream`, calling `on_event` with each one first.
    ///
    /// Transport errors and a stream that ends without a terminal event fail
    /// the exchange; a cancelled stream aborts it.
    pub async fn consume_with<F>(
        &mut self,
        stream: &mut DeltaStream,
        mut on_event: F,
    ) -> Result<(), ChatError>
    where
        F: FnMut(&Event),
    {
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    on_event(&event);
                    self.apply_event(event);
                }
                Err(e) => {
                    self.fail(e.to_string());
                    return Err(e);
                }
            }
        }

        if stream.is_cancelled() {
            self.abort();
        } else if self.status.is_busy() {
            let err = ChatError::transport("stream ended before the reply finished");
            self.fail(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    pub async fn consume(&mut self, stream: &mut DeltaStream) -> Result<(), ChatError> {
        self.consume_with(stream, |_| {}).await
    }

    /// Build the render model.
    pub fn view(&self) -> View {
        if self.conversation.is_empty() {
            return View::Landing {
                greeting: GREETING,
                headline: HEADLINE,
                placeholder: INPUT_PLACEHOLDER,
                input: self.input.clone(),
                suggestions: SUGGESTIONS.iter().map(|s| s.label).collect(),
            };
        }

        let messages = self
            .conversation
            .iter()
            .map(|message| RenderedMessage {
                id: message.id.clone(),
                role: message.role,
                paragraphs: message.text_parts().map(str::to_string).collect(),
            })
            .collect();

        View::Conversation {
            messages,
            typing_indicator: self.status.is_busy()
                && self.conversation.last_role() == Some(Role::User),
            input: self.input.clone(),
            placeholder: INPUT_PLACEHOLDER,
            submit_enabled: self.can_submit(),
            error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn accepted(outcome: SubmitOutcome) -> ChatRequest {
        match outcome {
            SubmitOutcome::Accepted(request) => request,
            other => panic!("expected an accepted submission, got {:?}", other),
        }
    }

    fn stream_of(events: Vec<Event>) -> DeltaStream {
        DeltaStream::new(stream::iter(events.into_iter().map(Ok)))
    }

    fn reply(deltas: &[&str]) -> Vec<Event> {
        let mut events = vec![Event::start("msg_reply"), Event::StartStep, Event::text_start("t1")];
        events.extend(deltas.iter().map(|d| Event::text_delta("t1", *d)));
        events.extend([Event::text_end("t1"), Event::FinishStep, Event::Finish]);
        events
    }

    #[test]
    fn test_default_session_has_a_chat_id() {
        let a = ChatSession::default();
        let b = ChatSession::default();
        assert!(a.chat_id().starts_with("chat_"));
        assert!(a.chat_id().len() > "chat_".len());
        assert_ne!(a.chat_id(), b.chat_id());

        let mut session = ChatSession::default();
        let request = accepted(session.submit("Hi"));
        assert_eq!(request.id.as_deref(), Some(session.chat_id()));
    }

    #[test]
    fn test_submit_from_idle_appends_one_user_message() {
        let mut session = ChatSession::new();
        session.set_input("Bonjour");

        let request = accepted(session.submit_input());

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[0].text(), "Bonjour");
        assert!(session.messages()[0].id.starts_with("msg_"));
        assert_eq!(session.status(), StreamStatus::Submitted);
        assert_eq!(session.input(), "");
        assert_eq!(request.messages, session.messages());
        assert_eq!(request.id.as_deref(), Some(session.chat_id()));
    }

    #[test]
    fn test_whitespace_is_rejected_without_mutation() {
        let mut session = ChatSession::new();
        session.set_input("   \n\t");

        assert_eq!(
            session.submit_input(),
            SubmitOutcome::Rejected(RejectReason::EmptyInput)
        );
        assert!(session.messages().is_empty());
        assert_eq!(session.status(), StreamStatus::Idle);
        assert_eq!(session.input(), "   \n\t");
    }

    #[test]
    fn test_submissions_while_busy_are_rejected() {
        let mut session = ChatSession::new();
        accepted(session.submit("first"));

        assert_eq!(
            session.submit("second"),
            SubmitOutcome::Rejected(RejectReason::Busy)
        );
        assert_eq!(
            session.suggest("Projects"),
            SubmitOutcome::Rejected(RejectReason::Busy)
        );

        session.apply_event(Event::start("a"));
        session.apply_event(Event::text_delta("t", "x"));
        assert_eq!(session.status(), StreamStatus::Streaming);
        assert_eq!(
            session.submit("third"),
            SubmitOutcome::Rejected(RejectReason::Busy)
        );
        assert_eq!(session.messages().len(), 2);
        assert!(!session.can_submit());
    }

    #[test]
    fn test_deltas_concatenate_in_order_and_end_idle() {
        let mut session = ChatSession::new();
        accepted(session.submit("Tell me about you"));

        for event in reply(&["Je ", "suis ", "développeur", "."]) {
            assert_eq!(session.apply_event(event), EventOutcome::Applied);
        }

        assert_eq!(session.status(), StreamStatus::Idle);
        let assistant = &session.messages()[1];
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.id, "msg_reply");
        assert_eq!(assistant.text(), "Je suis développeur.");
        assert_eq!(assistant.parts.len(), 1);
    }

    #[test]
    fn test_first_chunk_creates_empty_assistant_and_streams() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        session.apply_event(Event::start("msg_a"));
        assert_eq!(session.status(), StreamStatus::Streaming);
        assert_eq!(session.messages().len(), 2);
        assert!(session.messages()[1].parts.is_empty());
    }

    #[test]
    fn test_missing_message_id_is_generated() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        session.apply_event(Event::Start(folio_ui_types::StartEvent { message_id: None }));
        assert!(session.messages()[1].id.starts_with("msg_"));
    }

    #[test]
    fn test_text_start_after_text_end_opens_new_part() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        for event in [
            Event::start("m"),
            Event::text_start("t1"),
            Event::text_delta("t1", "one"),
            Event::text_delta("t1", " two"),
            Event::text_end("t1"),
            Event::text_start("t2"),
            Event::text_delta("t2", "three"),
            Event::text_end("t2"),
            Event::Finish,
        ] {
            session.apply_event(event);
        }

        let parts: Vec<&str> = session.messages()[1].text_parts().collect();
        assert_eq!(parts, vec!["one two", "three"]);
    }

    #[test]
    fn test_error_keeps_partial_reply() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        session.apply_event(Event::start("m"));
        session.apply_event(Event::text_delta("t", "partial"));
        session.apply_event(Event::error("upstream failed"));

        assert_eq!(session.status(), StreamStatus::Error);
        assert_eq!(session.last_error(), Some("upstream failed"));
        assert_eq!(session.messages()[1].text(), "partial");

        // No event lands once the exchange failed.
        assert_eq!(
            session.apply_event(Event::text_delta("t", " more")),
            EventOutcome::Ignored
        );
        assert_eq!(session.messages()[1].text(), "partial");
    }

    #[test]
    fn test_submit_is_accepted_again_after_error() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));
        session.apply_event(Event::error("boom"));

        accepted(session.submit("Again"));
        assert_eq!(session.status(), StreamStatus::Submitted);
        assert_eq!(session.last_error(), None);
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_abort_after_k_deltas_keeps_exactly_k() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        session.apply_event(Event::start("m"));
        session.apply_event(Event::text_start("t"));
        for delta in ["a", "b", "c"] {
            session.apply_event(Event::text_delta("t", delta));
        }
        assert!(session.abort());

        assert_eq!(session.status(), StreamStatus::Error);
        assert_eq!(session.messages()[1].text(), "abc");
        assert_eq!(
            session.apply_event(Event::text_delta("t", "late")),
            EventOutcome::Ignored
        );
        assert_eq!(session.messages()[1].text(), "abc");
        assert!(!session.abort());
    }

    #[test]
    fn test_events_after_finish_are_ignored() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));
        for event in reply(&["done"]) {
            session.apply_event(event);
        }

        assert_eq!(
            session.apply_event(Event::text_delta("t1", "!")),
            EventOutcome::Ignored
        );
        assert_eq!(session.messages()[1].text(), "done");
    }

    #[test]
    fn test_suggest_behaves_like_submit_and_keeps_draft() {
        let mut session = ChatSession::new();
        session.set_input("draft");

        let request = accepted(session.suggest("Resume"));
        assert_eq!(request.messages[0].text(), "Resume");
        assert_eq!(session.input(), "draft");
        assert_eq!(session.status(), StreamStatus::Submitted);
    }

    #[test]
    fn test_landing_view_until_first_message() {
        let session = ChatSession::new();
        match session.view() {
            View::Landing {
                greeting,
                suggestions,
                ..
            } => {
                assert_eq!(greeting, GREETING);
                assert_eq!(suggestions, vec!["About me", "Projects", "Contact", "Blog", "Resume"]);
            }
            other => panic!("expected landing view, got {:?}", other),
        }
    }

    #[test]
    fn test_typing_indicator_only_before_first_chunk() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        let View::Conversation {
            typing_indicator,
            submit_enabled,
            ..
        } = session.view()
        else {
            panic!("expected conversation view");
        };
        assert!(typing_indicator);
        assert!(!submit_enabled);

        session.apply_event(Event::start("m"));
        let View::Conversation {
            typing_indicator, ..
        } = session.view()
        else {
            panic!("expected conversation view");
        };
        assert!(!typing_indicator);

        session.apply_event(Event::Finish);
        let View::Conversation {
            typing_indicator,
            submit_enabled,
            ..
        } = session.view()
        else {
            panic!("expected conversation view");
        };
        assert!(!typing_indicator);
        assert!(submit_enabled);
    }

    #[test]
    fn test_view_skips_non_text_parts() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));
        session.apply_event(Event::start("m"));
        session.apply_event(Event::text_delta("t", "hello"));

        let View::Conversation { messages, .. } = session.view() else {
            panic!("expected conversation view");
        };
        assert_eq!(messages[1].paragraphs, vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_consume_applies_whole_reply() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        let mut seen = 0;
        let mut stream = stream_of(reply(&["a", "b"]));
        session
            .consume_with(&mut stream, |_| seen += 1)
            .await
            .unwrap();

        assert_eq!(seen, 8);
        assert_eq!(session.status(), StreamStatus::Idle);
        assert_eq!(session.messages()[1].text(), "ab");
    }

    #[tokio::test]
    async fn test_consume_truncated_stream_is_transport_error() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        let mut stream = stream_of(vec![Event::start("m"), Event::text_delta("t", "cut")]);
        let result = session.consume(&mut stream).await;

        assert!(matches!(result, Err(ChatError::Transport(_))));
        assert_eq!(session.status(), StreamStatus::Error);
        assert_eq!(session.messages()[1].text(), "cut");
    }

    #[tokio::test]
    async fn test_consume_cancelled_stream_aborts() {
        let mut session = ChatSession::new();
        accepted(session.submit("Hi"));

        let mut stream = stream_of(reply(&["never"]));
        stream.cancel();
        session.consume(&mut stream).await.unwrap();

        assert_eq!(session.status(), StreamStatus::Error);
        assert_eq!(session.last_error(), Some("aborted"));
        assert_eq!(session.messages().len(), 1);
    }
}
