//! Server-Sent Events encoding of the UI message stream.

use axum::http::header::{HeaderName, HeaderValue, CACHE_CONTROL};
use axum::response::sse::{Event as AxumEvent, KeepAlive};
use axum::response::{IntoResponse, Response, Sse};
use futures_util::Stream;
use pin_project_lite::pin_project;
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use folio_ui_types::{Event, DONE_MARKER, UI_MESSAGE_STREAM_HEADER, UI_MESSAGE_STREAM_VERSION};

/// Encode one UI event as an SSE `data:` frame.
pub fn to_axum_event(event: &Event) -> AxumEvent {
    match event.to_sse_data() {
        Ok(data) => AxumEvent::default().data(data),
        Err(e) => {
            log::error!("Failed to encode {} event: {}", event.event_type(), e);
            let fallback = Event::error(format!("Failed to encode event: {}", e));
            AxumEvent::default().data(
                fallback
                    .to_sse_data()
                    .unwrap_or_else(|_| r#"{"type":"error","errorText":"encoding failure"}"#.to_string()),
            )
        }
    }
}

pin_project! {
    /// Encodes UI events and appends the `[DONE]` marker once the inner stream ends.
    pub struct SseStream<S> {
        #[pin]
        inner: S,
        done_sent: bool,
    }
}

impl<S> SseStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            done_sent: false,
        }
    }
}

impl<S> Stream for SseStream<S>
where
    S: Stream<Item = Event>,
{
    type Item = std::result::Result<AxumEvent, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.done_sent {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(Ok(to_axum_event(&event)))),
            Poll::Ready(None) => {
                *this.done_sent = true;
                Poll::Ready(Some(Ok(AxumEvent::default().data(DONE_MARKER))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Create the streaming response for a chat request.
pub fn create_sse_response<S>(stream: S, keepalive_interval: Duration) -> Response
where
    S: Stream<Item = Event> + Send + 'static,
{
    let mut response = Sse::new(SseStream::new(stream))
        .keep_alive(
            KeepAlive::new()
                .interval(keepalive_interval)
                .text("keep-alive"),
        )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static(UI_MESSAGE_STREAM_HEADER),
        HeaderValue::from_static(UI_MESSAGE_STREAM_VERSION),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use futures_util::{stream, StreamExt as _};

    #[tokio::test]
    async fn test_done_marker_follows_last_event() {
        let events = vec![Event::start("msg_1"), Event::Finish];
        let mut sse_stream = SseStream::new(stream::iter(events));

        let first = sse_stream.next().await.unwrap().unwrap();
        let second = sse_stream.next().await.unwrap().unwrap();
        let done = sse_stream.next().await.unwrap().unwrap();

        assert!(format!("{:?}", first).contains("msg_1"));
        assert!(format!("{:?}", second).contains("finish"));
        assert!(format!("{:?}", done).contains(DONE_MARKER));
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_response_headers_and_body() {
        let events = vec![
            Event::start("msg_1"),
            Event::text_start("txt_1"),
            Event::text_delta("txt_1", "Hi"),
            Event::text_end("txt_1"),
            Event::Finish,
        ];
        let response = create_sse_response(stream::iter(events), Duration::from_secs(30));

        let headers = response.headers();
        assert_eq!(headers["content-type"], "text/event-stream");
        assert_eq!(headers[UI_MESSAGE_STREAM_HEADER], UI_MESSAGE_STREAM_VERSION);
        assert_eq!(headers["cache-control"], "no-cache");
        assert_eq!(headers["x-accel-buffering"], "no");

        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(r#"data: {"type":"start","messageId":"msg_1"}"#));
        assert!(body.contains(r#"data: {"type":"text-delta","id":"txt_1","delta":"Hi"}"#));
        assert!(body.trim_end().ends_with("data: [DONE]"));
    }
}
