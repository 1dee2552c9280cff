//! Tiny async HTTP client with bounded redirect following and live body streams.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable options and types
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations behind the [`Transport`] trait
//!
//! # Key Features
//!
//! - **Redirects**: 301-308 with a `Location` are followed up to a per-call
//!   limit; relative locations resolve against the URL that produced them
//! - **Two completion modes**: wait for the whole body, or resume on headers
//!   and read the body through a live stream
//! - **Timeouts**: one per-call value bounds the wait for headers and the
//!   gap between body chunks
//! - **Pluggable transport**: `reqwest` by default, anything implementing
//!   [`Transport`] otherwise
//!
//! # Example
//!
//! ```no_run
//! use tinyhttp::{Client, ClientOptions, RequestOptions, ReqwestTransport};
//!
//! # async fn example() -> tinyhttp::Result<()> {
//! let client = Client::new(ClientOptions::new("https://example.test"), ReqwestTransport::new()?);
//! let response = client
//!     .post("/documents", serde_json::json!({ "title": "notes" }), RequestOptions::default())
//!     .await?;
//! println!("{} after {} redirects", response.status(), response.redirect_count());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use crate::core::Encoding;
pub use crate::data::{
    ClientOptions, Completion, DownloadProgress, HeaderMap, Method, Payload, RequestOptions, ResponseHead,
};
#[cfg(feature = "reqwest")]
pub use crate::effects::ReqwestTransport;
pub use crate::effects::{
    BoxStream, ChunkStream, Client, LiveStream, OutgoingRequest, RawResponse, Response, Transport, USER_AGENT,
};
pub use crate::error::{BoxError, Error, Result};
