//! Cancellable stream of UI events for one reply.

use futures_util::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use folio_ui_types::Event;

use crate::error::ChatError;

type BoxedEvents = Pin<Box<dyn Stream<Item = Result<Event, ChatError>> + Send>>;

/// Events of one reply, in arrival order.
///
/// The stream is lazy, finite and cannot be restarted. It ends after the
/// first terminal event (`finish` or `error`), after a transport error, or as
/// soon as it is cancelled. Nothing is delivered once cancellation has been
/// requested, even if the inner stream already produced it. Dropping the
/// stream drops the underlying HTTP response.
pub struct DeltaStream {
    inner: BoxedEvents,
    token: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    finished: bool,
}

impl DeltaStream {
    pub fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = Result<Event, ChatError>> + Send + 'static,
    {
        Self::with_token(inner, CancellationToken::new())
    }

    /// Wrap `inner`, ending it when `token` is cancelled.
    pub fn with_token<S>(inner: S, token: CancellationToken) -> Self
    where
        S: Stream<Item = Result<Event, ChatError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
            cancelled: Box::pin(token.clone().cancelled_owned()),
            token,
            finished: false,
        }
    }

    /// Stop delivery. Safe to call more than once.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Handle that can cancel this stream from another task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The stream has ended and will yield nothing more.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Stream for DeltaStream {
    type Item = Result<Event, ChatError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.finished = true;
            return Poll::Ready(None);
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(item)) => {
                if this.token.is_cancelled() {
                    log::debug!("Dropping event received after cancellation");
                    this.finished = true;
                    return Poll::Ready(None);
                }
                match &item {
                    Ok(event) if event.is_terminal() => this.finished = true,
                    Err(_) => this.finished = true,
                    Ok(_) => {}
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
