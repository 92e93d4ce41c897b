use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;

use folio_ui_types::{ChatRequest, Event, SseParser, UiError};

use crate::error::{ChatError, Result};
use crate::stream::DeltaStream;
use crate::RelayClient;

/// HTTP client for a folio relay.
pub struct HttpRelayClient {
    base_url: String,
    client: reqwest::Client,
    connect_timeout: Duration,
}

impl HttpRelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Limit how long to wait for the relay to start answering.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Decode one `data:` payload. Unknown event types are skipped.
fn decode(data: &str) -> Result<Option<Event>> {
    match Event::from_sse_data(data) {
        Ok(event) => Ok(event),
        Err(UiError::InvalidEventType { event_type }) => {
            log::debug!("Skipping unsupported event type '{}'", event_type);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn send(&self, request: &ChatRequest) -> Result<DeltaStream> {
        let chat_url = format!("{}/api/chat", self.base_url);

        let response = tokio::time::timeout(
            self.connect_timeout,
            self.client
                .post(&chat_url)
                .header("Accept", "text/event-stream")
                .json(request)
                .send(),
        )
        .await
        .map_err(|_| {
            ChatError::transport(format!(
                "relay did not answer within {:?}",
                self.connect_timeout
            ))
        })??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut bytes = response.bytes_stream();

        let events = stream! {
            let mut parser = SseParser::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ChatError::from(e));
                        return;
                    }
                };

                for frame in parser.feed(&chunk) {
                    if frame.data.is_empty() {
                        continue;
                    }
                    if frame.data.trim() == folio_ui_types::DONE_MARKER {
                        return;
                    }
                    match decode(&frame.data) {
                        Ok(Some(event)) => yield Ok(event),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(frame) = parser.finish() {
                match decode(&frame.data) {
                    Ok(Some(event)) => yield Ok(event),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        };

        Ok(DeltaStream::new(events))
    }

    async fn health_check(&self) -> Result<()> {
        let health_url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&health_url)
            .timeout(self.connect_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChatError::Status {
                status: response.status().as_u16(),
                body: "health check failed".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalised() {
        let client = HttpRelayClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            decode(r#"{"type":"text-delta","id":"t","delta":"hi"}"#).unwrap(),
            Some(Event::text_delta("t", "hi"))
        );
        assert_eq!(decode(r#"{"type":"reasoning-delta","id":"r","delta":"…"}"#).unwrap(), None);
        assert_eq!(decode("[DONE]").unwrap(), None);
        assert!(matches!(decode("{oops"), Err(ChatError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let client = HttpRelayClient::new("http://127.0.0.1:9")
            .with_connect_timeout(Duration::from_secs(2));
        let result = client.send(&ChatRequest::new(Vec::new())).await;
        assert!(matches!(result, Err(ChatError::Transport(_))));
    }
}
