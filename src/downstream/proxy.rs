//! Streaming proxy forwarding.
//!
//! # Data Flow
//! ```text
//! inbound head ──▶ endpoint.first_chunk() ──▶ DownstreamFirstChunk
//!                                                   │
//! inbound body (streamed, not buffered) ────────────┤
//!                                                   ▼
//!                                         DownstreamClient::forward
//!                                                   │
//! client ◀── strip hop-by-hop ◀── downstream response (streamed back)
//! ```

use axum::body::Body;
use axum::http::{Request, Response};

use crate::downstream::headers::strip_hop_by_hop;
use crate::downstream::{DownstreamClient, DownstreamError};
use crate::endpoint::{ExecutionContext, ProxyRouterEndpoint, RequestInfo};
use crate::error::EndpointError;
use crate::validation::NoContent;

/// Forward one inbound request through a proxy endpoint.
pub async fn forward_request(
    endpoint: &dyn ProxyRouterEndpoint,
    head: RequestInfo<NoContent>,
    body: Body,
    client: &DownstreamClient,
    ctx: &ExecutionContext,
) -> Result<Response<Body>, EndpointError> {
    let chunk = endpoint.first_chunk(&head, ctx).await?;
    let uri = chunk.uri()?;

    tracing::debug!(
        request_id = %ctx.request_id(),
        endpoint = endpoint.name(),
        method = %chunk.method,
        target = %uri,
        "Proxying request"
    );

    let mut builder = Request::builder().method(chunk.method.clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        *headers = chunk.headers;
    }
    let request = builder
        .body(body)
        .map_err(|e| DownstreamError::InvalidRequest(e.to_string()))?;

    let response = client.forward(request, chunk.relaxed_tls).await?;
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);

    Ok(Response::from_parts(parts, Body::new(body)))
}
