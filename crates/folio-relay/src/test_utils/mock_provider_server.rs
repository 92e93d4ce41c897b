// src/test_utils/mock_provider_server.rs
use async_stream::stream;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A canned reply for one `/chat/completions` call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Stream each string as a `delta.content` chunk, then `[DONE]`.
    Deltas { chunks: Vec<String>, delay: Duration },
    /// Answer with a non-success status and a plain body.
    Status { status: u16, body: String },
    /// Send the given SSE text verbatim.
    Raw(String),
    /// Stream the chunks, then keep the connection open without sending anything.
    Stall { chunks: Vec<String> },
}

impl MockReply {
    pub fn deltas(chunks: &[&str]) -> Self {
        Self::Deltas {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow_deltas(chunks: &[&str], delay: Duration) -> Self {
        Self::Deltas {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            delay,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: body.to_string(),
        }
    }

    pub fn raw(body: &str) -> Self {
        Self::Raw(body.to_string())
    }

    pub fn stall(chunks: &[&str]) -> Self {
        Self::Stall {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockServerState {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn delta_frame(content: &str) -> String {
    let chunk = json!({
        "id": "cmpl-mock",
        "object": "chat.completion.chunk",
        "choices": [{ "index": 0, "delta": { "content": content }, "finish_reason": null }]
    });
    format!("data: {}\n\n", chunk)
}

fn finish_frame() -> String {
    let chunk = json!({
        "id": "cmpl-mock",
        "object": "chat.completion.chunk",
        "choices": [{ "index": 0, "delta": { "content": "" }, "finish_reason": "stop" }]
    });
    format!("data: {}\n\ndata: [DONE]\n\n", chunk)
}

fn event_stream(body: Body) -> Response {
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn chat_completions_handler(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    log::debug!("Mock provider received request: {}", body);
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { authorization, body });

    let reply = state.replies.lock().unwrap().pop_front();
    match reply {
        Some(MockReply::Deltas { chunks, delay }) => {
            let frames = stream! {
                for chunk in chunks {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    yield Ok::<_, Infallible>(delta_frame(&chunk));
                }
                yield Ok(finish_frame());
            };
            event_stream(Body::from_stream(frames))
        }
        Some(MockReply::Status { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body).into_response()
        }
        Some(MockReply::Raw(body)) => event_stream(Body::from(body)),
        Some(MockReply::Stall { chunks }) => {
            let frames = stream! {
                for chunk in chunks {
                    yield Ok::<_, Infallible>(delta_frame(&chunk));
                }
                futures_util::future::pending::<()>().await;
            };
            event_stream(Body::from_stream(frames))
        }
        None => {
            log::error!("Mock provider ran out of replies!");
            (StatusCode::SERVICE_UNAVAILABLE, "no reply configured").into_response()
        }
    }
}

/// In-process stand-in for an OpenAI-compatible streaming endpoint.
pub struct MockProviderServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    recorded_requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockProviderServer {
    pub async fn start(replies: Vec<MockReply>) -> Self {
        let state = MockServerState {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let recorded_requests = state.requests.clone();

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock provider to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock provider listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock provider error: {}", e);
                });
        });

        MockProviderServer {
            addr,
            shutdown_tx,
            recorded_requests,
        }
    }

    /// Base URL to hand to the client, including the `/v1` prefix.
    pub fn api_base(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.recorded_requests.lock().unwrap().clone()
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock provider shutdown signal already sent or receiver dropped.");
        }
    }
}
