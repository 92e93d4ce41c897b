//! Completion provider implementations
//!
//! A provider takes the converted conversation and returns a stream of text
//! deltas. The relay neither retries nor buffers; whatever the provider
//! yields is forwarded as it arrives.

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::ProviderError;

pub mod echo;
pub mod mistral;

/// Stream of generated text fragments.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Roles in the provider's chat schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    System,
    User,
    Assistant,
}

/// A message in the provider's `{role, content}` schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: ProviderRole,
    pub content: String,
}

impl ProviderMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ProviderRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ProviderRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ProviderRole::Assistant,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Identifier of the model serving the request, for logging.
    fn model(&self) -> &str;

    /// Open a streaming generation request.
    ///
    /// Errors returned here happen before any text was produced; errors
    /// inside the stream happen mid-generation.
    async fn stream_completion(
        &self,
        messages: Vec<ProviderMessage>,
    ) -> Result<DeltaStream, ProviderError>;
}

/// Create a provider based on the configuration
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    match config.kind {
        ProviderKind::Mistral => mistral::create_client(config),
        ProviderKind::Echo => Ok(Arc::new(echo::EchoProvider::new())),
    }
}
