//! Failures are handed to the caller, never logged by the library.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use tinyhttp::{BoxError, Client, ClientOptions, HeaderMap, OutgoingRequest, RawResponse, RequestOptions, Transport};

/// Shared buffer that the fmt subscriber writes into.
#[derive(Debug, Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String { String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned() }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

fn capture(level: tracing::Level) -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

#[derive(Debug)]
struct MockError;

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("mock error") }
}

impl std::error::Error for MockError {}

/// `/broken` fails mid-body, `/slow` never answers.
struct FailingTransport;

impl Transport for FailingTransport {
    type Error = MockError;

    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, Self::Error> {
        if request.url.path() == "/slow" {
            return std::future::pending().await;
        }
        let chunks = [Ok(Bytes::from_static(b"a")), Err(BoxError::from("reset by peer"))];
        Ok(RawResponse {
            status: Some(200),
            status_message: "OK".to_string(),
            headers: HeaderMap::new(),
            body: Box::pin(stream::iter(chunks)),
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_failures_emit_no_warnings() {
    let (logs, _guard) = capture(tracing::Level::WARN);
    let client = Client::new(ClientOptions::new("https://example.test"), FailingTransport);

    let mut response = client.get("/broken", RequestOptions::default().stream(true)).await.unwrap();
    let items: Vec<_> = response.take_stream().unwrap().collect().await;
    assert!(items.last().unwrap().is_err());
    assert!(response.finished().await.is_err());

    let err = client
        .get("/slow", RequestOptions::default().timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    assert_eq!(logs.contents(), "");
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_not_logged_at_any_level() {
    let (logs, _guard) = capture(tracing::Level::TRACE);
    let client = Client::new(ClientOptions::new("https://example.test"), FailingTransport);

    let mut response = client.get("/broken", RequestOptions::default().stream(true)).await.unwrap();
    let _ = response.take_stream().unwrap().collect::<Vec<_>>().await;
    assert!(response.finished().await.is_err());
    client
        .get("/slow", RequestOptions::default().timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();

    let output = logs.contents();
    assert!(output.contains("Dispatching request"), "success-path events are still emitted: {output}");
    assert!(!output.contains("reset by peer"), "{output}");
    assert!(!output.contains("timed out"), "{output}");
}
