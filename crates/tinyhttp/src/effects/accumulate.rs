use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::dispatch::Exchange;
use super::response::{BodySink, Response};
use super::transport::ChunkStream;
use crate::data::{DownloadProgress, RequestOptions, ResponseHead};
use crate::error::{Error, Result};

/// Reads a final response body into its [`Response`].
struct Driver {
    body: ChunkStream,
    cancel: CancellationToken,
    sink: BodySink,
    idle_timeout: Duration,
    total_bytes: Option<u64>,
    on_download: Option<Arc<dyn Fn(&DownloadProgress) + Send + Sync>>,
}

impl Driver {
    /// Pair an exchange with an empty response and the driver that fills it.
    fn start(exchange: Exchange, options: &RequestOptions, redirects: Vec<ResponseHead>) -> (Response, Self) {
        let Exchange { head, body, cancel } = exchange;
        let total_bytes = head.content_length();
        let (response, sink) = Response::pending(head, redirects);

        let driver = Self {
            body,
            cancel,
            sink,
            idle_timeout: options.timeout,
            total_bytes,
            on_download: options.on_download.clone(),
        };
        (response, driver)
    }

    /// Pull chunks until the stream ends, fails, or stalls for longer than
    /// the idle timeout.
    async fn pump(&mut self) -> Result<u64> {
        let mut bytes_downloaded = 0;
        loop {
            let next = match tokio::time::timeout(self.idle_timeout, self.body.next()).await {
                Ok(next) => next,
                Err(_) => {
                    self.cancel.cancel();
                    return Err(Error::Timeout(self.idle_timeout));
                }
            };

            let Some(chunk) = next else {
                return Ok(bytes_downloaded);
            };
            let chunk = chunk.map_err(Error::Transport)?;
            let chunk_size = chunk.len();
            bytes_downloaded = self.sink.push(chunk);

            trace!(chunk_size, bytes_downloaded, total_bytes = ?self.total_bytes, "Received body chunk");

            if let Some(on_download) = &self.on_download {
                on_download(&DownloadProgress {
                    bytes_downloaded,
                    chunk_size,
                    total_bytes: self.total_bytes,
                });
            }
        }
    }
}

/// Read the whole body, then hand back the completed response.
pub(crate) async fn buffered(exchange: Exchange, options: &RequestOptions, redirects: Vec<ResponseHead>) -> Result<Response> {
    let (response, mut driver) = Driver::start(exchange, options, redirects);
    let url = response.url().clone();

    let bytes = driver.pump().await?;
    driver.sink.complete();
    debug!(%url, bytes, "Response body complete");
    Ok(response)
}

/// Hand back the response at once and keep filling its body in a task.
///
/// Body errors surface through [`Response::finished`] and as the last item
/// of the live stream.
pub(crate) fn streaming(exchange: Exchange, options: &RequestOptions, redirects: Vec<ResponseHead>) -> Response {
    let (response, mut driver) = Driver::start(exchange, options, redirects);
    let url = response.url().clone();

    tokio::spawn(async move {
        match driver.pump().await {
            Ok(bytes) => {
                driver.sink.complete();
                debug!(%url, bytes, "Streamed response body complete");
            }
            Err(err) => driver.sink.fail(err),
        }
    });

    response
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use futures_util::stream;
    use url::Url;

    use super::*;
    use crate::data::HeaderMap;
    use crate::error::BoxError;

    fn exchange(chunks: Vec<std::result::Result<Bytes, BoxError>>, content_length: Option<u64>) -> Exchange {
        let mut headers = HeaderMap::new();
        if let Some(len) = content_length {
            headers.insert("Content-Length", len.to_string());
        }
        Exchange {
            head: ResponseHead::new(Some(200), "OK", headers, Url::parse("https://example.test/file").unwrap()),
            body: Box::pin(stream::iter(chunks)),
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_buffered_collects_all_chunks() {
        let exchange = exchange(vec![Ok(Bytes::from_static(b"o")), Ok(Bytes::from_static(b"k"))], None);
        let response = buffered(exchange, &RequestOptions::default(), Vec::new()).await.unwrap();

        assert!(response.is_complete());
        assert_eq!(response.text(), "ok");
    }

    #[tokio::test]
    async fn test_empty_body_completes() {
        let response = buffered(exchange(Vec::new(), None), &RequestOptions::default(), Vec::new())
            .await
            .unwrap();
        assert!(response.data().is_empty());
        assert!(response.is_complete());
    }

    #[tokio::test]
    async fn test_buffered_propagates_stream_error() {
        let chunks = vec![Ok(Bytes::from_static(b"part")), Err("connection reset".into())];
        let err = buffered(exchange(chunks, None), &RequestOptions::default(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_progress_reports_every_chunk() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let options = RequestOptions::default().on_download(Arc::new(move |progress: &DownloadProgress| {
            recorder.lock().unwrap().push((progress.bytes_downloaded, progress.chunk_size, progress.total_bytes));
        }));

        let chunks = vec![Ok(Bytes::from_static(b"abc")), Ok(Bytes::from_static(b"de"))];
        buffered(exchange(chunks, Some(5)), &options, Vec::new()).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), [(3, 3, Some(5)), (5, 2, Some(5))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_body_times_out_and_cancels() {
        let cancel = CancellationToken::new();
        let exchange = Exchange {
            head: ResponseHead::new(Some(200), "OK", HeaderMap::new(), Url::parse("https://example.test/").unwrap()),
            body: Box::pin(stream::iter([Ok::<_, BoxError>(Bytes::from_static(b"x"))]).chain(stream::pending())),
            cancel: cancel.clone(),
        };
        let options = RequestOptions::default().timeout(Duration::from_millis(50));

        let err = buffered(exchange, &options, Vec::new()).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_streaming_stall_reports_timeout() {
        let cancel = CancellationToken::new();
        let exchange = Exchange {
            head: ResponseHead::new(Some(200), "OK", HeaderMap::new(), Url::parse("https://example.test/").unwrap()),
            body: Box::pin(stream::iter([Ok::<_, BoxError>(Bytes::from_static(b"x"))]).chain(stream::pending())),
            cancel: cancel.clone(),
        };
        let options = RequestOptions::default().stream(true).timeout(Duration::from_millis(30));

        let mut response = streaming(exchange, &options, Vec::new());
        let items: Vec<_> = response.take_stream().unwrap().collect().await;

        assert!(matches!(items.last(), Some(Err(Error::Timeout(_)))));
        let err = response.finished().await.unwrap_err();
        assert!(err.is_timeout());
        assert!(cancel.is_cancelled());
        assert_eq!(response.data(), Bytes::from_static(b"x"));
    }

    #[tokio::test]
    async fn test_streaming_fills_in_background() {
        let chunks = vec![Ok(Bytes::from_static(b"hello ")), Ok(Bytes::from_static(b"world"))];
        let mut response = streaming(exchange(chunks, None), &RequestOptions::default(), Vec::new());
        let live = response.take_stream().unwrap();

        let collected: Vec<Bytes> = live.map(|chunk| chunk.unwrap()).collect().await;
        assert_eq!(collected.concat(), b"hello world");
        assert_eq!(response.finished().await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_streaming_error_ends_live_stream() {
        let chunks = vec![Ok(Bytes::from_static(b"a")), Err("boom".into())];
        let mut response = streaming(exchange(chunks, None), &RequestOptions::default(), Vec::new());
        let mut live = response.take_stream().unwrap();

        assert!(live.next().await.unwrap().is_ok());
        assert!(live.next().await.unwrap().is_err());
        assert!(response.finished().await.is_err());
    }
}
