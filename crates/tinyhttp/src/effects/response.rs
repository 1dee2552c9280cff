use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};
use url::Url;

use crate::core::Encoding;
use crate::data::{HeaderMap, ResponseHead};
use crate::error::{Error, Result};

/// Fill state of a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyState {
    Filling,
    Complete,
    Failed(Failure),
}

/// What ended a body early, kept so [`Response::finished`] can rebuild an
/// error of the same kind.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    Timeout(Duration),
    Other(String),
}

impl Failure {
    fn from_error(err: &Error) -> Self {
        match err {
            Error::Timeout(timeout) => Failure::Timeout(*timeout),
            Error::Transport(source) => Failure::Other(source.to_string()),
            other => Failure::Other(other.to_string()),
        }
    }

    fn into_error(self) -> Error {
        match self {
            Failure::Timeout(timeout) => Error::Timeout(timeout),
            Failure::Other(message) => Error::Transport(message.into()),
        }
    }
}

type SharedBuffer = Arc<Mutex<BytesMut>>;

fn lock(buffer: &SharedBuffer) -> MutexGuard<'_, BytesMut> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Push-based mirror of a response body, yielding chunks in arrival order.
///
/// The stream ends when the body is complete. If the body fails after the
/// caller was resumed (streaming mode), the error is the last item.
#[derive(Debug)]
pub struct LiveStream {
    rx: mpsc::UnboundedReceiver<Result<Bytes>>,
}

impl Stream for LiveStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Writing half of a response body, owned by the accumulator.
///
/// Dropping the sink without calling [`BodySink::complete`] or
/// [`BodySink::fail`] marks the body as aborted.
#[derive(Debug)]
pub(crate) struct BodySink {
    buffer: SharedBuffer,
    live: mpsc::UnboundedSender<Result<Bytes>>,
    state: watch::Sender<BodyState>,
}

impl BodySink {
    /// Append to the buffer and mirror onto the live stream.
    pub(crate) fn push(&self, chunk: Bytes) -> u64 {
        let total = {
            let mut buffer = lock(&self.buffer);
            buffer.extend_from_slice(&chunk);
            buffer.len() as u64
        };
        // The caller may have dropped or never taken the live stream.
        let _ = self.live.send(Ok(chunk));
        total
    }

    pub(crate) fn complete(self) { self.state.send_replace(BodyState::Complete); }

    pub(crate) fn fail(self, err: Error) {
        self.state.send_replace(BodyState::Failed(Failure::from_error(&err)));
        let _ = self.live.send(Err(err));
    }
}

/// A finished exchange: head, cumulative body buffer and live body stream.
#[derive(Debug)]
pub struct Response {
    head: ResponseHead,
    buffer: SharedBuffer,
    live: Option<LiveStream>,
    state: watch::Receiver<BodyState>,
    redirects: Vec<ResponseHead>,
}

impl Response {
    /// An empty response whose body is filled through the returned sink.
    pub(crate) fn pending(head: ResponseHead, redirects: Vec<ResponseHead>) -> (Self, BodySink) {
        let buffer = SharedBuffer::default();
        let (live_tx, live_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(BodyState::Filling);

        let response = Self {
            head,
            buffer: Arc::clone(&buffer),
            live: Some(LiveStream { rx: live_rx }),
            state: state_rx,
            redirects,
        };
        let sink = BodySink {
            buffer,
            live: live_tx,
            state: state_tx,
        };
        (response, sink)
    }

    /// Status code; 200 if the transport reported none.
    pub fn status(&self) -> u16 { self.head.status }

    pub fn status_message(&self) -> &str { &self.head.status_message }

    pub fn headers(&self) -> &HeaderMap { &self.head.headers }

    pub fn header(&self, name: &str) -> Option<&str> { self.head.headers.get(name) }

    /// URL of the request that produced this response, after redirects.
    pub fn url(&self) -> &Url { &self.head.url }

    pub fn head(&self) -> &ResponseHead { &self.head }

    /// `true` iff the status is in `[200, 300)`.
    pub fn is_ok(&self) -> bool { self.head.is_ok() }

    /// Redirect responses followed before this one, oldest first.
    pub fn redirects(&self) -> &[ResponseHead] { &self.redirects }

    pub fn redirect_count(&self) -> usize { self.redirects.len() }

    /// Snapshot of the bytes received so far.
    ///
    /// In streaming mode this may be partial; see [`Response::finished`].
    pub fn data(&self) -> Bytes { Bytes::copy_from_slice(&lock(&self.buffer)) }

    /// `true` once the body stream has closed cleanly.
    pub fn is_complete(&self) -> bool { *self.state.borrow() == BodyState::Complete }

    /// Body as UTF-8 text, with invalid sequences replaced.
    pub fn text(&self) -> String { self.text_with(Encoding::Utf8) }

    pub fn text_with(&self, encoding: Encoding) -> String { encoding.decode(&lock(&self.buffer)) }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> { Ok(serde_json::from_slice(&lock(&self.buffer))?) }

    /// Take the live byte stream. Returns `None` after the first call.
    pub fn take_stream(&mut self) -> Option<LiveStream> { self.live.take() }

    /// Wait for the body to finish and return all of it.
    ///
    /// Resolves immediately for buffered responses.
    pub async fn finished(&self) -> Result<Bytes> {
        let mut state = self.state.clone();
        let outcome = state.wait_for(|s| *s != BodyState::Filling).await.map(|s| s.clone());
        match outcome {
            Ok(BodyState::Complete) => Ok(self.data()),
            Ok(BodyState::Failed(failure)) => Err(failure.into_error()),
            Ok(BodyState::Filling) | Err(_) => Err(Error::Transport("response body aborted".into())),
        }
    }
}
