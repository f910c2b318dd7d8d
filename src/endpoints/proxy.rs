//! `/exampleProxy`: streams the request to `/example` on this server.

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};

use crate::downstream::{DownstreamFirstChunk, DownstreamTarget};
use crate::endpoint::{ExecutionContext, ProxyRouterEndpoint, RequestInfo};
use crate::endpoints::example;
use crate::error::EndpointError;
use crate::routing::{Matcher, RouteError};
use crate::validation::NoContent;

pub const MATCHING_PATH: &str = "/exampleProxy";

/// Adds `foobar: baz` to every proxied request and skips certificate
/// checks, since the local target may use a self-signed certificate.
#[derive(Debug, Clone)]
pub struct ExampleProxyRouter {
    target: DownstreamTarget,
}

impl ExampleProxyRouter {
    pub fn new(port: u16, ssl_port: u16, use_ssl: bool) -> Self {
        Self::with_target(DownstreamTarget {
            host: "127.0.0.1".to_string(),
            port: if use_ssl { ssl_port } else { port },
            https: use_ssl,
            path: example::MATCHING_PATH.to_string(),
        })
    }

    pub fn with_target(target: DownstreamTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl ProxyRouterEndpoint for ExampleProxyRouter {
    fn name(&self) -> &'static str {
        "example_proxy"
    }

    fn matcher(&self) -> Result<Matcher, RouteError> {
        Matcher::match_all_methods(MATCHING_PATH)
    }

    async fn first_chunk(
        &self,
        request: &RequestInfo<NoContent>,
        _ctx: &ExecutionContext,
    ) -> Result<DownstreamFirstChunk, EndpointError> {
        Ok(DownstreamFirstChunk::from_inbound(request, self.target.clone())
            .relax_tls()
            .with_header(HeaderName::from_static("foobar"), HeaderValue::from_static("baz")))
    }
}
