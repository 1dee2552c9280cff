//! I/O for the request pipeline.
//!
//! The transport trait and its `reqwest` implementation, the dispatcher that
//! issues one hop, the redirect driver that chains hops, the accumulator
//! that fills a response body, and the client facade on top.

mod accumulate;
mod client;
mod dispatch;
mod follow;
mod response;
mod transport;

pub use client::{Client, USER_AGENT};
pub use response::{LiveStream, Response};
pub use transport::{BoxStream, ChunkStream, OutgoingRequest, RawResponse, Transport};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
