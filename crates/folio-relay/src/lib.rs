//! Streaming chat relay for the portfolio site.
//!
//! The widget posts the whole conversation to `POST /api/chat`; the relay
//! prepends the persona prompt, forwards the exchange to the completion
//! provider and streams the generated text back as UI message stream events
//! over SSE. Nothing is stored between requests.

pub mod config;
pub mod convert;
pub mod error;
pub mod provider;
pub mod relay;
pub mod sse;
pub mod test_utils;

pub use config::{ConfigLoader, RelayConfig};
pub use convert::{convert_to_model_messages, validate_request};
pub use error::{ProviderError, RelayError, Result};
pub use provider::{create_provider, CompletionProvider, DeltaStream, ProviderMessage, ProviderRole};
pub use relay::{relay_stream, EventStream};

pub use folio_ui_types::{ChatRequest, Event, Message, Role};

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::{Json, Response};
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Runtime settings of the relay server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
    /// Keep-alive interval for SSE connections
    pub sse_keepalive_interval: Duration,
    /// Longest silence tolerated between two provider chunks
    pub idle_timeout: Duration,
    /// Persona instruction prepended to every conversation
    pub system_prompt: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            enable_cors: true,
            cors_origins: None,
            max_body_size: 1024 * 1024,
            enable_logging: true,
            sse_keepalive_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            system_prompt: config::DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the server settings from a loaded configuration file.
    pub fn from_relay_config(config: &RelayConfig) -> Result<Self> {
        let cors_origins = if config.server.cors_origins.is_empty() {
            None
        } else {
            Some(config.server.cors_origins.clone())
        };

        Ok(Self {
            bind_addr: config.bind_addr()?,
            cors_origins,
            max_body_size: config.server.max_body_size,
            sse_keepalive_interval: Duration::from_secs(config.server.sse_keepalive_secs),
            idle_timeout: config.provider.idle_timeout(),
            system_prompt: config.persona.system_prompt.clone(),
            ..Self::default()
        })
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    pub fn with_sse_keepalive(mut self, interval: Duration) -> Self {
        self.sse_keepalive_interval = interval;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

/// Shared application state: the provider handle and immutable settings.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub config: Arc<ServerConfig>,
}

/// Handler for the /api/chat POST endpoint.
async fn chat_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|rejection| {
        log::warn!("Rejected chat body: {}", rejection.body_text());
        RelayError::invalid_request(rejection.body_text())
    })?;

    if let Err(e) = validate_request(&request) {
        log::warn!("Input validation failed: {}", e);
        return Err(e);
    }

    log::info!(
        "Received chat request {} with {} messages",
        request.id.as_deref().unwrap_or("-"),
        request.messages.len()
    );

    let messages = convert_to_model_messages(&state.config.system_prompt, &request.messages);
    let events = relay_stream(state.provider.clone(), messages, state.config.idle_timeout);

    Ok(sse::create_sse_response(
        events,
        state.config.sse_keepalive_interval,
    ))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The relay HTTP server.
pub struct RelayServer {
    provider: Arc<dyn CompletionProvider>,
    config: ServerConfig,
}

impl RelayServer {
    /// Create a new server with the given provider and default configuration.
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            config: ServerConfig::default(),
        }
    }

    pub fn with_config(provider: Arc<dyn CompletionProvider>, config: ServerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            provider: self.provider.clone(),
            config: Arc::new(self.config.clone()),
        };

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/api/chat", post(chat_handler))
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(state);

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>, next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    if uri.path() == "/health" {
                        log::debug!("Request {} {} {}", request_id, method, uri);
                    } else {
                        log::info!("Request {} {} {}", request_id, method, uri);
                    }

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;

                    log::debug!(
                        "Response {} {} headers sent in {:?}",
                        request_id,
                        response.status(),
                        start.elapsed()
                    );

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors_layer = match &self.config.cors_origins {
                Some(origins) => {
                    let parsed: std::result::Result<Vec<_>, _> =
                        origins.iter().map(|s| s.parse()).collect();
                    match parsed {
                        Ok(origins) => CorsLayer::new()
                            .allow_origin(origins)
                            .allow_methods(Any)
                            .allow_headers(Any),
                        Err(_) => {
                            log::warn!("Invalid CORS origin in {:?}, allowing any", origins);
                            CorsLayer::permissive()
                        }
                    }
                }
                None => CorsLayer::permissive(),
            };
            router = router.layer(cors_layer);
        }

        router
    }

    async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.config.bind_addr).await.map_err(|e| {
            RelayError::config_error(format!(
                "Failed to bind to {}: {}",
                self.config.bind_addr, e
            ))
        })
    }

    /// Start the server and listen for connections until it fails.
    pub async fn serve(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve_on_listener(listener, std::future::pending()).await
    }

    /// Start the server and shut down gracefully when `shutdown_signal` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve_on_listener(listener, shutdown_signal).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on_listener<F>(self, listener: TcpListener, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let router = self.build_router();

        log::info!(
            "folio relay starting on {} (model: {})",
            addr,
            self.provider.model()
        );
        log::info!("Health check: http://{}/health", addr);
        log::info!("Chat endpoint: http://{}/api/chat", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| RelayError::internal(format!("Server error: {}", e)))?;

        log::info!("folio relay shut down gracefully");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}
