//! Offline provider that streams the last user message back word by word.

use async_stream::stream;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

use super::{CompletionProvider, DeltaStream, ProviderMessage, ProviderRole};
use crate::error::ProviderError;

#[derive(Debug, Clone)]
pub struct EchoProvider {
    chunk_delay: Duration,
}

impl EchoProvider {
    pub fn new() -> Self {
        Self {
            chunk_delay: Duration::from_millis(50),
        }
    }

    pub fn with_chunk_delay(mut self, chunk_delay: Duration) -> Self {
        self.chunk_delay = chunk_delay;
        self
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for EchoProvider {
    fn model(&self) -> &str {
        "echo"
    }

    async fn stream_completion(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> Result<DeltaStream, ProviderError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == ProviderRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let response = format!("Echo: {}", last_user);
        let words: Vec<String> = response
            .split_inclusive(' ')
            .map(|w| w.to_string())
            .collect();
        let chunk_delay = self.chunk_delay;

        Ok(Box::pin(stream! {
            for word in words {
                yield Ok(word);
                sleep(chunk_delay).await;
            }
        }))
    }
}
