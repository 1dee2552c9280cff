//! Error types for tinyhttp.

use std::time::Duration;

use thiserror::Error;

/// Boxed error carried from a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("too many redirects (limit {max})")]
    TooManyRedirects { max: u32 },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport(Box::new(err))
    }

    /// Returns `true` for errors raised before any network I/O.
    #[must_use]
    pub fn is_invalid_url(&self) -> bool { matches!(self, Error::InvalidUrl(_)) }

    #[must_use]
    pub fn is_timeout(&self) -> bool { matches!(self, Error::Timeout(_)) }

    #[must_use]
    pub fn is_too_many_redirects(&self) -> bool { matches!(self, Error::TooManyRedirects { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
