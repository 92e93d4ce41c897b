use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use folio_ui_types::{SseParser, DONE_MARKER};

use super::{CompletionProvider, DeltaStream, ProviderMessage};
use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// Client for Mistral's OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct MistralClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl MistralClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: crate::config::DEFAULT_API_BASE.to_string(),
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_request_body(&self, messages: &[ProviderMessage]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        if let Some(temp) = self.temperature {
            body["temperature"] = temp.into();
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }

        body
    }
}

/// Pull the text out of one `data:` payload. `Ok(None)` means nothing to emit.
fn parse_chunk(data: &str) -> Result<Option<String>, ProviderError> {
    let chunk: CompletionChunk = serde_json::from_str(data)
        .map_err(|e| ProviderError::Parse(format!("{}: {}", e, data)))?;

    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };
    if let Some(reason) = &choice.finish_reason {
        log::debug!("Provider finished with reason: {}", reason);
    }
    Ok(choice.delta.content.filter(|c| !c.is_empty()))
}

#[async_trait]
impl CompletionProvider for MistralClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn stream_completion(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> Result<DeltaStream, ProviderError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(&messages);

        log::debug!(
            "Mistral request to {} with {} messages",
            url,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error while reading error response body".to_string());
            log::error!("Mistral API request failed with status {}: {}", status, body);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut bytes = response.bytes_stream();

        let stream = try_stream! {
            let mut parser = SseParser::new();
            let mut done = false;

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                for frame in parser.feed(&chunk) {
                    if frame.data.trim() == DONE_MARKER {
                        done = true;
                        break 'read;
                    }
                    if let Some(content) = parse_chunk(&frame.data)? {
                        yield content;
                    }
                }
            }

            if !done {
                if let Some(frame) = parser.finish() {
                    if frame.data.trim() != DONE_MARKER {
                        if let Some(content) = parse_chunk(&frame.data)? {
                            yield content;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Create a Mistral client from configuration
pub fn create_client(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    let api_key = config.resolve_api_key().ok_or_else(|| {
        ProviderError::Config("No API key found for Mistral. Set api_key or api_key_env".to_string())
    })?;

    let mut client =
        MistralClient::new(api_key, config.model.clone()).with_api_base(config.api_base.clone());

    if let Some(temperature) = config.temperature {
        client = client.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        client = client.with_max_tokens(max_tokens);
    }

    Ok(Arc::new(client))
}
