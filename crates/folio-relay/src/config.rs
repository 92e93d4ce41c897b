//! Relay configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! relay that talks to Mistral with the portfolio persona.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::error::{RelayError, Result};

pub const DEFAULT_MODEL: &str = "mistral-small-latest";
pub const DEFAULT_API_BASE: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_API_KEY_ENV: &str = "MISTRAL_API_KEY";

pub const DEFAULT_SYSTEM_PROMPT: &str = "Tu es un assistant sur le site portfolio de Quentin Truffy, développeur logiciel. Réponds de manière concise et amicale. Tu peux répondre en français ou en anglais selon la langue de la question.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_keepalive_secs")]
    pub sse_keepalive_secs: u64,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_origins: Vec::new(),
            sse_keepalive_secs: default_keepalive_secs(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Which completion backend serves the chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Mistral,
    /// Offline backend that streams the last user message back.
    Echo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            model: default_model(),
            api_base: default_api_base(),
            api_key: None,
            api_key_env: default_api_key_env(),
            temperature: None,
            max_tokens: None,
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key from the inline value or the named env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.api_key_env
                .as_ref()
                .and_then(|env_var| std::env::var(env_var).ok())
        })
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_keepalive_secs() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_api_key_env() -> Option<String> {
    Some(DEFAULT_API_KEY_ENV.to_string())
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl RelayConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind_addr.parse().map_err(|e| {
            RelayError::config_error(format!(
                "Invalid bind address '{}': {}",
                self.server.bind_addr, e
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.persona.system_prompt.trim().is_empty() {
            return Err(RelayError::config_error("persona.system_prompt must not be empty"));
        }
        if self.provider.model.trim().is_empty() {
            return Err(RelayError::config_error("provider.model must not be empty"));
        }
        if self.provider.idle_timeout_secs == 0 {
            return Err(RelayError::config_error(
                "provider.idle_timeout_secs must be greater than zero",
            ));
        }
        self.bind_addr()?;
        Ok(())
    }
}

/// Configuration loader for YAML files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<RelayConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            RelayError::config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_str(content: &str) -> Result<RelayConfig> {
        let config: RelayConfig = if content.trim().is_empty() {
            RelayConfig::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| RelayError::config_error(format!("Failed to parse YAML: {}", e)))?
        };
        config.validate()?;
        Ok(config)
    }
}
