use url::Url;

use super::headers::HeaderMap;

/// Status used when the transport reports none.
pub const FALLBACK_STATUS: u16 = 200;

/// Status line, headers and origin URL of one exchange.
///
/// Redirect hops are recorded as heads only; their bodies are never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub status_message: String,
    pub headers: HeaderMap,
    /// URL of the request that produced this response.
    pub url: Url,
}

impl ResponseHead {
    /// Build a head, substituting [`FALLBACK_STATUS`] for a missing status.
    pub fn new(status: Option<u16>, status_message: impl Into<String>, headers: HeaderMap, url: Url) -> Self {
        Self {
            status: status.unwrap_or(FALLBACK_STATUS),
            status_message: status_message.into(),
            headers,
            url,
        }
    }

    /// `true` iff the status is in `[200, 300)`.
    pub fn is_ok(&self) -> bool { (200..300).contains(&self.status) }

    pub fn location(&self) -> Option<&str> { self.headers.get("location") }

    /// Parsed `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.headers.get("content-length").and_then(|v| v.trim().parse().ok())
    }
}
