//! Remote document API access.
//!
//! Every outbound call goes through [`RequestPipeline`], which applies the
//! shared [`RateLimiter`] and [`ResponseCache`] of its endpoint before handing
//! the request to a [`Transport`].

pub mod cache;
pub mod client;
pub mod limiter;
pub mod pipeline;
pub mod transport;

pub use cache::{cache_key, ResponseCache};
pub use client::DocumentClient;
pub use limiter::RateLimiter;
pub use pipeline::RequestPipeline;
pub use transport::{
    Endpoint, HttpMethod, RawResponse, RemoteRequest, ReqwestTransport, Transport, TransportError,
};
