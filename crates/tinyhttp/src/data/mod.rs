//! Immutable data types for requests and responses.
//!
//! Option structs, header maps and response heads live here. None of these
//! types perform I/O; they are built by the caller and threaded through the
//! [`crate::core`] and [`crate::effects`] layers unchanged.

pub mod head;
pub mod headers;
pub mod options;
pub mod progress;

pub use head::{FALLBACK_STATUS, ResponseHead};
pub use headers::HeaderMap;
pub use options::{
    ClientOptions, Completion, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT, Method, Payload, RequestOptions,
};
pub use progress::DownloadProgress;
