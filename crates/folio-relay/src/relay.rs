//! Turns a provider delta stream into UI message stream events.

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use folio_ui_types::{generate_message_id, Event};

use crate::error::ProviderError;
use crate::provider::{CompletionProvider, ProviderMessage};

/// Stream of UI events for one assistant message.
pub type EventStream = Pin<Box<dyn Stream<Item = Event> + Send>>;

/// Logs when a relay stream is dropped before it reached a terminal event.
struct AbortGuard {
    message_id: String,
    started: Instant,
    deltas: usize,
    completed: bool,
}

impl AbortGuard {
    fn new(message_id: String) -> Self {
        Self {
            message_id,
            started: Instant::now(),
            deltas: 0,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if !self.completed {
            log::info!(
                "Client went away, aborted message {} after {} deltas in {:?}",
                self.message_id,
                self.deltas,
                self.started.elapsed()
            );
        }
    }
}

/// Relay one generation as UI events.
///
/// The provider request is only opened when the stream is first polled, and
/// dropping the stream drops the provider response with it. The provider must
/// answer, and then send each chunk, within `idle_timeout`, otherwise the
/// generation is reported as failed.
pub fn relay_stream(
    provider: Arc<dyn CompletionProvider>,
    messages: Vec<ProviderMessage>,
    idle_timeout: Duration,
) -> EventStream {
    let message_id = generate_message_id();
    let text_id = format!("txt_{}", &message_id["msg_".len()..]);

    Box::pin(stream! {
        let mut guard = AbortGuard::new(message_id.clone());
        log::debug!(
            "Relaying message {} from model {} ({} input messages)",
            message_id,
            provider.model(),
            messages.len()
        );

        yield Event::start(message_id.clone());
        yield Event::StartStep;

        let opened = timeout(idle_timeout, provider.stream_completion(messages))
            .await
            .unwrap_or(Err(ProviderError::Timeout(idle_timeout)));
        let mut deltas = match opened {
            Ok(deltas) => deltas,
            Err(e) => {
                log::error!("Provider request for message {} failed: {}", message_id, e);
                guard.complete();
                yield Event::error(e.to_string());
                return;
            }
        };

        yield Event::text_start(text_id.clone());

        loop {
            let failure = match timeout(idle_timeout, deltas.next()).await {
                Ok(Some(Ok(delta))) => {
                    guard.deltas += 1;
                    yield Event::text_delta(text_id.clone(), delta);
                    continue;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => e,
                Err(_) => ProviderError::Timeout(idle_timeout),
            };

            log::error!(
                "Provider stream for message {} failed after {} deltas: {}",
                message_id,
                guard.deltas,
                failure
            );
            guard.complete();
            yield Event::error(failure.to_string());
            return;
        }

        yield Event::text_end(text_id.clone());
        yield Event::FinishStep;
        guard.complete();
        log::info!(
            "Finished message {} with {} deltas in {:?}",
            message_id,
            guard.deltas,
            guard.started.elapsed()
        );
        yield Event::Finish;
    })
}
