//! Immutable view of an inbound request as seen by an endpoint.

use std::net::SocketAddr;

use axum::http::{HeaderMap, Method, Uri};
use bytes::Bytes;

use crate::routing::PathParams;

/// An inbound request with its decoded content.
///
/// `raw_body` is the buffered body for standard endpoints and empty for
/// proxy endpoints, whose body is streamed separately.
#[derive(Debug, Clone)]
pub struct RequestInfo<T> {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub path_params: PathParams,
    pub raw_body: Bytes,
    pub content: T,
    pub request_id: String,
    pub remote_addr: Option<SocketAddr>,
}

impl<T> RequestInfo<T> {
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Decoded query string pairs, in order.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Declared `Content-Length`, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.header(axum::http::header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse().ok())
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Swap the decoded content, keeping everything else.
    pub fn with_content<U>(self, content: U) -> RequestInfo<U> {
        RequestInfo {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            path_params: self.path_params,
            raw_body: self.raw_body,
            content,
            request_id: self.request_id,
            remote_addr: self.remote_addr,
        }
    }
}
