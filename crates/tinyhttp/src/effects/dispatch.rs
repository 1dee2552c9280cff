use std::fmt;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::transport::{ChunkStream, OutgoingRequest, Transport};
use crate::core::{Scheme, apply_overrides};
use crate::data::{HeaderMap, Method, Payload, RequestOptions, ResponseHead};
use crate::error::{Error, Result};

/// One request/response exchange with headers received and the body still
/// unread.
pub(crate) struct Exchange {
    pub head: ResponseHead,
    pub body: ChunkStream,
    /// Cancelling aborts the body stream of this exchange.
    pub cancel: CancellationToken,
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("head", &self.head)
            .field("body", &"{ ... }")
            .finish()
    }
}

/// Serialize the payload, adding a JSON content type where needed.
fn encode_body(payload: Option<&Payload>, headers: &mut HeaderMap) -> Result<Bytes> {
    match payload {
        Some(Payload::Json(value)) => {
            headers.insert("Content-Type", "application/json");
            Ok(Bytes::from(serde_json::to_vec(value)?))
        }
        Some(Payload::Text(text)) => Ok(Bytes::from(text.clone())),
        None => Ok(Bytes::new()),
    }
}

/// Issue a single request and wait for its response headers.
///
/// Query parameters and the port override from `options` are applied to
/// `url` first. If headers do not arrive within `options.timeout`, the
/// exchange is cancelled and [`Error::Timeout`] returned.
pub(crate) async fn dispatch<T: Transport>(
    transport: &T,
    method: Method,
    url: Url,
    headers: &HeaderMap,
    options: &RequestOptions,
) -> Result<Exchange> {
    let url = apply_overrides(url, &options.params, options.port)?;
    let scheme = Scheme::from_url(&url)?;

    let mut headers = headers.clone();
    let body = encode_body(options.payload.as_ref(), &mut headers)?;
    let cancel = CancellationToken::new();

    debug!(%method, %url, scheme = scheme.as_str(), body_len = body.len(), "Dispatching request");

    let request = OutgoingRequest {
        method,
        url: url.clone(),
        scheme,
        headers,
        body,
        cancel: cancel.clone(),
    };

    let raw = tokio::select! {
        biased;
        result = transport.send(request) => result.map_err(Error::transport)?,
        () = tokio::time::sleep(options.timeout) => {
            cancel.cancel();
            return Err(Error::Timeout(options.timeout));
        }
    };

    let head = ResponseHead::new(raw.status, raw.status_message, raw.headers, url);
    debug!(status = head.status, url = %head.url, "Received response headers");

    Ok(Exchange {
        head,
        body: raw.body,
        cancel,
    })
}
