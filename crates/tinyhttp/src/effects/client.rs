use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::follow::run_chain;
use super::response::Response;
use super::transport::Transport;
use crate::core::{check_target, resolve};
use crate::data::{ClientOptions, Method, Payload, RequestOptions};
use crate::error::Result;

/// `User-Agent` sent when neither the client nor the call sets one.
pub const USER_AGENT: &str = concat!("tinyhttp/", env!("CARGO_PKG_VERSION"));

/// HTTP client with a base URL, default headers and a transport.
///
/// Cloning is cheap: options and transport are shared.
///
/// # Examples
///
/// ```no_run
/// use tinyhttp::{Client, ClientOptions, RequestOptions, ReqwestTransport};
///
/// # async fn example() -> tinyhttp::Result<()> {
/// let options = ClientOptions::new("https://example.test/api/").header("Accept", "application/json");
/// let client = Client::new(options, ReqwestTransport::new()?);
///
/// let response = client.get("users/1", RequestOptions::default()).await?;
/// if response.is_ok() {
///     println!("{}", response.text());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Client<T: Transport> {
    options: Arc<ClientOptions>,
    transport: Arc<T>,
    default_client: Option<Arc<Client<T>>>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            options: Arc::clone(&self.options),
            transport: Arc::clone(&self.transport),
            default_client: self.default_client.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .field("has_default_client", &self.default_client.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Client<T> {
    pub fn new(options: ClientOptions, transport: T) -> Self { Self::with_transport(options, Arc::new(transport)) }

    /// Build a client on a transport shared with other clients.
    pub fn with_transport(options: ClientOptions, transport: Arc<T>) -> Self {
        Self {
            options: Arc::new(options),
            transport,
            default_client: None,
        }
    }

    /// Client used for redirects whose location is not path-rooted.
    ///
    /// Without one, such redirects go through this client.
    #[must_use]
    pub fn with_default_client(mut self, default_client: Arc<Client<T>>) -> Self {
        self.default_client = Some(default_client);
        self
    }

    pub fn config(&self) -> &ClientOptions { &self.options }

    pub fn transport(&self) -> &T { &self.transport }

    pub fn default_client(&self) -> Option<&Client<T>> { self.default_client.as_deref() }

    pub(crate) fn redirect_client(&self) -> &Client<T> { self.default_client().unwrap_or(self) }

    /// `GET` unless `options.method` says otherwise.
    pub async fn get(&self, target: &str, options: RequestOptions) -> Result<Response> {
        self.without_payload(Method::Get, target, options).await
    }

    pub async fn delete(&self, target: &str, options: RequestOptions) -> Result<Response> {
        self.without_payload(Method::Delete, target, options).await
    }

    pub async fn options(&self, target: &str, options: RequestOptions) -> Result<Response> {
        self.without_payload(Method::Options, target, options).await
    }

    /// `POST` `payload` unless `options.method` says otherwise.
    pub async fn post(&self, target: &str, payload: impl Into<Payload>, options: RequestOptions) -> Result<Response> {
        self.with_payload(Method::Post, target, payload.into(), options).await
    }

    pub async fn put(&self, target: &str, payload: impl Into<Payload>, options: RequestOptions) -> Result<Response> {
        self.with_payload(Method::Put, target, payload.into(), options).await
    }

    async fn without_payload(&self, method: Method, target: &str, options: RequestOptions) -> Result<Response> {
        let method = options.method.unwrap_or(method);
        self.request(method, target, None, options).await
    }

    async fn with_payload(
        &self,
        method: Method,
        target: &str,
        payload: Payload,
        options: RequestOptions,
    ) -> Result<Response> {
        let method = options.method.unwrap_or(method);
        self.request(method, target, Some(payload), options).await
    }

    /// Issue `method` against `target`, following redirects.
    ///
    /// `payload`, when given, replaces any payload set on `options`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`](crate::Error::InvalidUrl) if the target cannot
    ///   be resolved or uses an unsupported scheme
    /// - [`Error::InvalidHeader`](crate::Error::InvalidHeader) for a header
    ///   that cannot be sent
    /// - [`Error::TooManyRedirects`](crate::Error::TooManyRedirects) once the
    ///   chain would exceed `options.max_redirects`
    /// - [`Error::Timeout`](crate::Error::Timeout) when headers or the next
    ///   body chunk do not arrive in time
    /// - [`Error::Transport`](crate::Error::Transport) for connection and
    ///   stream failures
    pub async fn request(
        &self,
        method: Method,
        target: &str,
        payload: Option<Payload>,
        mut options: RequestOptions,
    ) -> Result<Response> {
        check_target(target, self.options.has_base_url())?;
        let base = Some(self.options.base_url.as_str());
        let url = resolve(target, base)?;

        let mut headers = self.options.headers.clone().merged(&options.headers);
        headers.insert_default("User-Agent", USER_AGENT);
        headers.validate()?;

        if payload.is_some() {
            options.payload = payload;
        }

        debug!(%method, %url, max_redirects = options.max_redirects, stream = options.stream, "Starting request");
        run_chain(self, method, url, &headers, &options).await
    }
}
