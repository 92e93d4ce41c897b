//! Chat client for the portfolio relay.
//!
//! [`ChatSession`] holds the conversation and the status of the reply in
//! progress; a [`RelayClient`] sends the conversation and hands back the
//! reply as a cancellable [`DeltaStream`] of UI events.

use async_trait::async_trait;

use folio_ui_types::ChatRequest;

pub mod conversation;
pub mod error;
pub mod http_client;
pub mod session;
pub mod status;
pub mod stream;
pub mod suggestions;

pub use conversation::Conversation;
pub use error::{ChatError, Result};
pub use http_client::HttpRelayClient;
pub use session::{ChatSession, EventOutcome, RejectReason, RenderedMessage, SubmitOutcome, View};
pub use status::StreamStatus;
pub use stream::DeltaStream;
pub use suggestions::{Suggestion, SUGGESTIONS};

/// Transport to a chat relay.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Post the conversation and stream back the reply.
    async fn send(&self, request: &ChatRequest) -> Result<DeltaStream>;

    /// Check that the relay is reachable.
    async fn health_check(&self) -> Result<()>;
}

/// Send an accepted submission and apply the whole reply to `session`.
///
/// Connection failures fail the exchange the same way a broken stream does.
pub async fn run_exchange<C: RelayClient + ?Sized>(
    client: &C,
    session: &mut ChatSession,
    request: &ChatRequest,
) -> Result<()> {
    let mut stream = match client.send(request).await {
        Ok(stream) => stream,
        Err(e) => {
            session.fail(e.to_string());
            return Err(e);
        }
    };
    session.consume(&mut stream).await
}
