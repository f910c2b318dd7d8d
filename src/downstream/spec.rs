//! Descriptions of outbound requests.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use bytes::Bytes;
use url::Url;

use crate::downstream::headers::{append_forwarded, forwardable_request_headers};
use crate::downstream::DownstreamError;
use crate::endpoint::RequestInfo;

/// A fully buffered outbound call, built by an endpoint.
#[derive(Debug, Clone)]
pub struct DownstreamRequestSpec {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Skip peer certificate validation for HTTPS targets.
    pub relaxed_tls: bool,
}

impl DownstreamRequestSpec {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: HeaderMap::new(),
            body: None,
            relaxed_tls: false,
        }
    }

    pub fn with_query_param(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn relax_tls(mut self) -> Self {
        self.relaxed_tls = true;
        self
    }

    pub fn uri(&self) -> Result<Uri, DownstreamError> {
        self.url
            .as_str()
            .parse()
            .map_err(|e| DownstreamError::InvalidRequest(format!("bad url {}: {}", self.url, e)))
    }
}

/// Fixed downstream location a proxy endpoint routes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamTarget {
    pub host: String,
    pub port: u16,
    pub https: bool,
    /// Path on the target; the inbound query string is appended to it.
    pub path: String,
}

/// First chunk of a proxied request: where it goes and with which head.
/// The body follows separately as a stream.
#[derive(Debug, Clone)]
pub struct DownstreamFirstChunk {
    pub target: DownstreamTarget,
    pub method: Method,
    pub headers: HeaderMap,
    pub relaxed_tls: bool,
}

impl DownstreamFirstChunk {
    /// Start from the inbound request: same method, forwardable headers,
    /// `X-Forwarded-*` added, and the inbound query string carried over.
    pub fn from_inbound<T>(request: &RequestInfo<T>, target: DownstreamTarget) -> Self {
        let mut headers = forwardable_request_headers(&request.headers);
        append_forwarded(
            &mut headers,
            request.remote_addr.map(|addr| addr.ip()),
            request.uri.scheme_str().unwrap_or("http"),
            request.headers.get(axum::http::header::HOST),
        );

        let mut target = target;
        if let Some(query) = request.uri.query() {
            target.path = format!("{}?{}", target.path, query);
        }

        Self {
            target,
            method: request.method.clone(),
            headers,
            relaxed_tls: false,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn relax_tls(mut self) -> Self {
        self.relaxed_tls = true;
        self
    }

    pub fn uri(&self) -> Result<Uri, DownstreamError> {
        let scheme = if self.target.https { "https" } else { "http" };
        let raw = format!(
            "{}://{}:{}{}",
            scheme, self.target.host, self.target.port, self.target.path
        );
        raw.parse()
            .map_err(|e| DownstreamError::InvalidRequest(format!("bad target {}: {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PathParams;
    use crate::validation::NoContent;

    #[test]
    fn test_spec_builder_adds_query_params() {
        let spec = DownstreamRequestSpec::new(Method::GET, Url::parse("http://localhost:8080/example").unwrap())
            .with_query_param("some_query_param", "foo")
            .with_header(axum::http::header::ACCEPT, HeaderValue::from_static("application/json"));

        assert_eq!(
            spec.uri().unwrap().to_string(),
            "http://localhost:8080/example?some_query_param=foo"
        );
        assert_eq!(spec.headers[axum::http::header::ACCEPT], "application/json");
        assert!(!spec.relaxed_tls);
    }

    #[test]
    fn test_first_chunk_from_inbound() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::HOST, HeaderValue::from_static("svc:8080"));
        headers.insert(axum::http::header::CONNECTION, HeaderValue::from_static("close"));
        let request = RequestInfo {
            method: Method::PUT,
            uri: "/exampleProxy?x=1".parse().unwrap(),
            headers,
            path_params: PathParams::new(),
            raw_body: Bytes::new(),
            content: NoContent,
            request_id: "req-1".into(),
            remote_addr: Some("127.0.0.1:5555".parse().unwrap()),
        };

        let chunk = DownstreamFirstChunk::from_inbound(
            &request,
            DownstreamTarget {
                host: "localhost".into(),
                port: 8443,
                https: true,
                path: "/example".into(),
            },
        )
        .with_header(HeaderName::from_static("foobar"), HeaderValue::from_static("baz"))
        .relax_tls();

        assert_eq!(chunk.method, Method::PUT);
        assert_eq!(chunk.uri().unwrap().to_string(), "https://localhost:8443/example?x=1");
        assert!(chunk.relaxed_tls);
        assert_eq!(chunk.headers["foobar"], "baz");
        assert_eq!(chunk.headers["x-forwarded-for"], "127.0.0.1");
        assert_eq!(chunk.headers["x-forwarded-host"], "svc:8080");
        assert!(!chunk.headers.contains_key(axum::http::header::CONNECTION));
        assert!(!chunk.headers.contains_key(axum::http::header::HOST));
    }
}
