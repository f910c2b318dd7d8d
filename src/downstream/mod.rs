//! Downstream HTTP calls.
//!
//! # Data Flow
//! ```text
//! Buffered (async-call endpoints):
//!     DownstreamRequestSpec → client.rs execute() → DownstreamResponse
//!
//! Streaming (proxy endpoints):
//!     DownstreamFirstChunk + inbound body → proxy.rs → client.rs forward()
//! ```
//!
//! # Design Decisions
//! - One pooled client per process, shared through the config snapshot
//! - Certificate validation is on unless a call opts out with `relax_tls()`
//! - Connection failures and timeouts become temporary (503) errors; non-2xx
//!   answers become unrecoverable (500) errors

pub mod client;
pub mod headers;
pub mod proxy;
pub mod spec;
pub mod tls;

pub use client::{DownstreamClient, DownstreamError, DownstreamResponse};
pub use proxy::forward_request;
pub use spec::{DownstreamFirstChunk, DownstreamRequestSpec, DownstreamTarget};
