//! Shared non-blocking HTTP client for downstream calls.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Response, StatusCode};
use bytes::Bytes;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::ClientConfig;

use crate::components::OnceResource;
use crate::config::DownstreamConfig;
use crate::downstream::spec::DownstreamRequestSpec;
use crate::downstream::tls::{crypto_provider, relaxed_client_config};
use crate::error::{ApiException, CoreApiError, EndpointError};

type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Largest downstream body `execute` will buffer.
const MAX_BUFFERED_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    #[error("invalid downstream request: {0}")]
    InvalidRequest(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("could not connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("request to {target} failed: {source}")]
    Request {
        target: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("request to {target} timed out after {after:?}")]
    Timeout { target: String, after: Duration },

    #[error("{target} responded with {status}")]
    BadStatus { target: String, status: StatusCode },

    #[error("reading response body from {target} failed: {reason}")]
    Body { target: String, reason: String },
}

impl From<DownstreamError> for EndpointError {
    fn from(error: DownstreamError) -> Self {
        let exception = match &error {
            DownstreamError::Connect { .. } | DownstreamError::Timeout { .. } => {
                ApiException::new(CoreApiError::OutsideDependencyReturnedATemporaryError)
            }
            DownstreamError::BadStatus { status, .. } => ApiException::new(
                CoreApiError::OutsideDependencyReturnedAnUnrecoverableError
                    .api_error()
                    .with_metadata("downstream_status", status.as_u16()),
            ),
            DownstreamError::Request { .. } | DownstreamError::Body { .. } => {
                ApiException::new(CoreApiError::OutsideDependencyReturnedAnUnrecoverableError)
            }
            DownstreamError::InvalidRequest(_) | DownstreamError::Tls(_) => {
                return EndpointError::Unexpected(error.into());
            }
        };
        EndpointError::Api(exception.with_exception_message(error.to_string()))
    }
}

/// A buffered downstream response.
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl DownstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

struct Inner {
    strict: HttpsClient,
    relaxed: OnceResource<HttpsClient>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

/// Pooled HTTP/HTTPS client shared by every endpoint.
///
/// The relaxed-TLS client is only built the first time an endpoint asks
/// for it.
#[derive(Clone)]
pub struct DownstreamClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for DownstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownstreamClient")
            .field("connect_timeout", &self.inner.connect_timeout)
            .field("request_timeout", &self.inner.request_timeout)
            .field("relaxed_initialized", &self.inner.relaxed.is_initialized())
            .finish()
    }
}

fn build_client(tls: Option<ClientConfig>, connect_timeout: Duration) -> Result<HttpsClient, DownstreamError> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));
    http.set_nodelay(true);

    let builder = match tls {
        Some(config) => HttpsConnectorBuilder::new().with_tls_config(config),
        None => HttpsConnectorBuilder::new().with_provider_and_webpki_roots(crypto_provider())?,
    };
    let connector = builder.https_or_http().enable_http1().wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new()).build(connector))
}

impl DownstreamClient {
    pub fn new(config: &DownstreamConfig) -> Result<Self, DownstreamError> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        Ok(Self {
            inner: Arc::new(Inner {
                strict: build_client(None, connect_timeout)?,
                relaxed: OnceResource::new("relaxed-tls-client"),
                connect_timeout,
                request_timeout,
            }),
        })
    }

    async fn client_for(&self, relaxed_tls: bool) -> Result<&HttpsClient, DownstreamError> {
        if !relaxed_tls {
            return Ok(&self.inner.strict);
        }
        let connect_timeout = self.inner.connect_timeout;
        self.inner
            .relaxed
            .get_or_try_init(|| async move { build_client(Some(relaxed_client_config()?), connect_timeout) })
            .await
    }

    async fn send(
        &self,
        request: Request<Body>,
        relaxed_tls: bool,
    ) -> Result<Response<Incoming>, DownstreamError> {
        let target = request.uri().to_string();
        let client = self.client_for(relaxed_tls).await?;
        let after = self.inner.request_timeout;

        match tokio::time::timeout(after, client.request(request)).await {
            Err(_) => Err(DownstreamError::Timeout { target, after }),
            Ok(Err(source)) if source.is_connect() => Err(DownstreamError::Connect { target, source }),
            Ok(Err(source)) => Err(DownstreamError::Request { target, source }),
            Ok(Ok(response)) => Ok(response),
        }
    }

    /// Issue a buffered call. Non-2xx statuses are errors.
    pub async fn execute(&self, spec: DownstreamRequestSpec) -> Result<DownstreamResponse, DownstreamError> {
        let uri = spec.uri()?;
        let target = uri.to_string();

        let mut builder = Request::builder().method(spec.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(spec.headers.clone());
        }
        let body = spec.body.clone().map(Body::from).unwrap_or_else(Body::empty);
        let request = builder
            .body(body)
            .map_err(|e| DownstreamError::InvalidRequest(e.to_string()))?;

        let response = self.send(request, spec.relaxed_tls).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownstreamError::BadStatus { target, status });
        }

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), MAX_BUFFERED_RESPONSE_BYTES)
            .await
            .map_err(|e| DownstreamError::Body {
                target,
                reason: e.to_string(),
            })?;

        Ok(DownstreamResponse {
            status,
            headers: parts.headers,
            body,
        })
    }

    /// Send a streaming request and return the streaming response.
    /// Non-2xx statuses are errors.
    pub async fn forward(
        &self,
        request: Request<Body>,
        relaxed_tls: bool,
    ) -> Result<Response<Incoming>, DownstreamError> {
        let target = request.uri().to_string();
        let response = self.send(request, relaxed_tls).await?;
        if !response.status().is_success() {
            return Err(DownstreamError::BadStatus {
                target,
                status: response.status(),
            });
        }
        Ok(response)
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let bad_status = DownstreamError::BadStatus {
            target: "http://localhost/example".into(),
            status: StatusCode::NOT_FOUND,
        };
        match EndpointError::from(bad_status) {
            EndpointError::Api(ex) => {
                let error = &ex.errors()[0];
                assert_eq!(error.name, "OUTSIDE_DEPENDENCY_RETURNED_AN_UNRECOVERABLE_ERROR");
                assert_eq!(error.metadata["downstream_status"], 404);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let timeout = DownstreamError::Timeout {
            target: "http://localhost/example".into(),
            after: Duration::from_secs(1),
        };
        match EndpointError::from(timeout) {
            EndpointError::Api(ex) => assert_eq!(ex.errors()[0].status, StatusCode::SERVICE_UNAVAILABLE),
            other => panic!("unexpected: {other:?}"),
        }

        let invalid = DownstreamError::InvalidRequest("nope".into());
        assert!(matches!(EndpointError::from(invalid), EndpointError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = DownstreamClient::new(&DownstreamConfig::default()).unwrap();
        let spec = DownstreamRequestSpec::new(
            axum::http::Method::GET,
            url::Url::parse(&format!("http://127.0.0.1:{}/example", port)).unwrap(),
        );
        let err = client.execute(spec).await.unwrap_err();
        assert!(matches!(err, DownstreamError::Connect { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_relaxed_client_is_lazy() {
        let client = DownstreamClient::new(&DownstreamConfig::default()).unwrap();
        assert!(!client.inner.relaxed.is_initialized());
        client.client_for(true).await.unwrap();
        assert!(client.inner.relaxed.is_initialized());
    }
}
