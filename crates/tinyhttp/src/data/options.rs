use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::headers::HeaderMap;
use super::progress::DownloadProgress;
use crate::error::Result;

/// Redirect limit applied when the caller sets none.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Timeout applied when the caller sets none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Request methods supported by the client facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Request payload. JSON and raw text are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Serialized with `serde_json`; adds `Content-Type: application/json`.
    Json(serde_json::Value),
    /// Written verbatim.
    Text(String),
}

impl Payload {
    /// Build a JSON payload from any serializable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    pub fn is_json(&self) -> bool { matches!(self, Payload::Json(_)) }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self { Payload::Text(text.to_string()) }
}

impl From<String> for Payload {
    fn from(text: String) -> Self { Payload::Text(text) }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self { Payload::Json(value) }
}

/// How the final response body is completed before the caller is resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completion {
    /// Resume the caller once the whole body is buffered.
    #[default]
    Buffered,
    /// Resume the caller as soon as headers arrive; the body keeps filling.
    Streaming,
}

/// Client-level defaults shared by every call made through one client.
///
/// # Examples
///
/// ```
/// use tinyhttp::ClientOptions;
///
/// let options = ClientOptions::new("https://example.test")
///     .header("Authorization", "Bearer token");
/// assert_eq!(options.base_url, "https://example.test");
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientOptions {
    /// Base URL that request targets are resolved against. Empty means none.
    #[serde(default)]
    pub base_url: String,

    /// Headers sent with every request made through the client.
    #[serde(default)]
    pub headers: HeaderMap,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the default headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn has_base_url(&self) -> bool { !self.base_url.is_empty() }
}

/// Per-call request configuration.
///
/// # Examples
///
/// ```
/// use tinyhttp::RequestOptions;
/// use std::time::Duration;
///
/// let options = RequestOptions::default()
///     .max_redirects(2)
///     .timeout(Duration::from_secs(5))
///     .header("Accept", "application/json");
/// assert_eq!(options.max_redirects, 2);
/// ```
#[derive(Clone)]
pub struct RequestOptions {
    /// Method override. `None` lets the facade helper pick its own method.
    pub method: Option<Method>,

    /// Per-call headers, layered over the client defaults.
    pub headers: HeaderMap,

    /// Request body.
    pub payload: Option<Payload>,

    /// Maximum number of redirect hops to follow.
    ///
    /// Default: 5
    pub max_redirects: u32,

    /// Time allowed for headers to arrive, and between body chunks.
    ///
    /// Default: 15s
    pub timeout: Duration,

    /// Resume the caller once headers arrive instead of after the body.
    ///
    /// Default: false
    pub stream: bool,

    /// Query parameters merged over those already present in the target.
    pub params: Vec<(String, String)>,

    /// Port override applied to every hop's URL.
    pub port: Option<u16>,

    /// Invoked after each body chunk of the final response.
    pub on_download: Option<Arc<dyn Fn(&DownloadProgress) + Send + Sync>>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("payload", &self.payload)
            .field("max_redirects", &self.max_redirects)
            .field("timeout", &self.timeout)
            .field("stream", &self.stream)
            .field("params", &self.params)
            .field("port", &self.port)
            .field("on_download", &self.on_download.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: None,
            headers: HeaderMap::new(),
            payload: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout: DEFAULT_TIMEOUT,
            stream: false,
            params: Vec::new(),
            port: None,
            on_download: None,
        }
    }
}

impl RequestOptions {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a JSON body, replacing any text body.
    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.payload = Some(Payload::Json(value));
        self
    }

    /// Attach a raw text body, replacing any JSON body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.payload = Some(Payload::Text(text.into()));
        self
    }

    #[must_use]
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the download progress callback.
    ///
    /// # Examples
    ///
    /// ```
    /// use tinyhttp::{DownloadProgress, RequestOptions};
    /// use std::sync::Arc;
    ///
    /// let options = RequestOptions::default().on_download(Arc::new(|progress: &DownloadProgress| {
    ///     if let Some(pct) = progress.percentage() {
    ///         println!("{pct:.1}%");
    ///     }
    /// }));
    /// ```
    #[must_use]
    pub fn on_download(mut self, on_download: Arc<dyn Fn(&DownloadProgress) + Send + Sync>) -> Self {
        self.on_download = Some(on_download);
        self
    }

    pub fn completion(&self) -> Completion {
        if self.stream { Completion::Streaming } else { Completion::Buffered }
    }
}
