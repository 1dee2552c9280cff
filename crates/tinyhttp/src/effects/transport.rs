use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::Scheme;
use crate::data::{HeaderMap, Method};
use crate::error::BoxError;

/// A boxed stream type for response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Body chunks as delivered by a transport, in order.
pub type ChunkStream = BoxStream<'static, std::result::Result<Bytes, BoxError>>;

/// A complete request, ready to be written by a transport.
///
/// The body is fully materialized: once a transport has written it the
/// request side is finished.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    /// Selects the secure or plain connector.
    pub scheme: Scheme,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Cancelled when the request's timeout fires.
    pub cancel: CancellationToken,
}

/// Response as delivered by a transport once headers are in.
pub struct RawResponse {
    /// `None` when the transport did not report a status.
    pub status: Option<u16>,
    pub status_message: String,
    pub headers: HeaderMap,
    pub body: ChunkStream,
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("status_message", &self.status_message)
            .field("headers", &self.headers)
            .field("body", &"{ ... }")
            .finish()
    }
}

/// Asynchronous transport abstraction.
///
/// A transport opens a connection for the request's scheme, writes headers
/// and body, and resolves once response headers are available. It must not
/// follow redirects itself.
///
/// # Implementations
///
/// - [`ReqwestTransport`]: production implementation using `reqwest`
/// - Scripted implementations for testing
pub trait Transport: Send + Sync {
    /// Error type for connection and request failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send `request` and resolve with the response head and body stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// request cannot be written. Non-2xx statuses are not errors.
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = std::result::Result<RawResponse, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::*;
    use crate::error::{Error, Result};

    /// Production transport backed by `reqwest`, with its own redirect
    /// handling disabled.
    ///
    /// Holds one client per [`Scheme`]: `https` requests go through the
    /// secure client, which refuses plain connections, and `http` requests
    /// through the plain one.
    ///
    /// Response header values that are not valid UTF-8 are decoded lossily,
    /// so no header the server sent is dropped.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        plain: reqwest::Client,
        secure: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Result<Self> { Self::from_builders(reqwest::Client::builder(), reqwest::Client::builder()) }

        /// Build from a caller-configured builder (proxies, TLS roots, pool
        /// settings), used for both schemes. The redirect policy is always
        /// overridden to `none`.
        pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self> {
            let client = build(builder)?;
            Ok(Self {
                plain: client.clone(),
                secure: client,
            })
        }

        /// Build with separate connection settings for `http` and `https`.
        pub fn from_builders(plain: reqwest::ClientBuilder, secure: reqwest::ClientBuilder) -> Result<Self> {
            Ok(Self {
                plain: build(plain)?,
                secure: build(secure.https_only(true))?,
            })
        }

        fn client_for(&self, scheme: Scheme) -> &reqwest::Client {
            if scheme.is_secure() { &self.secure } else { &self.plain }
        }
    }

    fn build(builder: reqwest::ClientBuilder) -> Result<reqwest::Client> {
        builder
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(Error::transport)
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }

    impl Transport for ReqwestTransport {
        type Error = reqwest::Error;

        async fn send(&self, request: OutgoingRequest) -> std::result::Result<RawResponse, Self::Error> {
            let mut builder = self.client_for(request.scheme).request(method(request.method), request.url);

            for (name, value) in request.headers.iter() {
                builder = builder.header(name, value);
            }

            if !request.body.is_empty() {
                builder = builder.body(request.body);
            }

            let response = builder.send().await?;
            let status = response.status();

            let mut headers = HeaderMap::new();
            for (name, value) in response.headers() {
                headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
            }

            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| Box::new(e) as BoxError))
                .take_until(request.cancel.cancelled_owned());

            Ok(RawResponse {
                status: Some(status.as_u16()),
                status_message: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestTransport;
