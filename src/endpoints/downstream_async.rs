//! `/exampleDownstreamHttpAsync`: calls `/example` on this same server
//! through the shared non-blocking client.

use std::time::Instant;

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use serde_json::{Map, Value};
use url::Url;

use crate::downstream::{DownstreamClient, DownstreamRequestSpec};
use crate::endpoint::{ExecutionContext, RequestInfo, ResponseInfo, StandardEndpoint};
use crate::endpoints::example;
use crate::error::{ApiException, CoreApiError, EndpointError};
use crate::routing::{Matcher, RouteError};
use crate::validation::NoContent;

pub const MATCHING_PATH: &str = "/exampleDownstreamHttpAsync";

#[derive(Debug, Clone)]
pub struct ExampleDownstreamHttpAsync {
    client: DownstreamClient,
    downstream_url: Url,
    https: bool,
}

impl ExampleDownstreamHttpAsync {
    /// Target `/example` on the local server, over TLS when `use_ssl`.
    pub fn new(client: DownstreamClient, port: u16, ssl_port: u16, use_ssl: bool) -> Result<Self, url::ParseError> {
        let base = if use_ssl {
            format!("https://127.0.0.1:{}", ssl_port)
        } else {
            format!("http://127.0.0.1:{}", port)
        };
        Ok(Self {
            client,
            downstream_url: Url::parse(&base)?.join(example::MATCHING_PATH)?,
            https: use_ssl,
        })
    }

    pub fn downstream_url(&self) -> &Url {
        &self.downstream_url
    }
}

#[async_trait]
impl StandardEndpoint for ExampleDownstreamHttpAsync {
    type Input = NoContent;
    type Output = Map<String, Value>;

    fn name(&self) -> &'static str {
        "example_downstream_http_async"
    }

    fn matcher(&self) -> Result<Matcher, RouteError> {
        Matcher::match_all_methods(MATCHING_PATH)
    }

    async fn execute(
        &self,
        request: RequestInfo<NoContent>,
        ctx: &ExecutionContext,
    ) -> Result<ResponseInfo<Map<String, Value>>, EndpointError> {
        let mut spec = DownstreamRequestSpec::new(request.method.clone(), self.downstream_url.clone())
            .with_query_param("some_query_param", "foo")
            .with_header(header::ACCEPT, HeaderValue::from_static("application/json"));
        if !request.raw_body.is_empty() {
            spec = spec
                .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .with_body(request.raw_body.clone());
        }
        if self.https {
            spec = spec.relax_tls();
        }

        tracing::info!(request_id = %ctx.request_id(), target = %self.downstream_url, "About to make async downstream call");
        let started = Instant::now();
        let response = self.client.execute(spec).await?;
        tracing::info!(
            request_id = %ctx.request_id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            status = %response.status,
            "Downstream call completed"
        );

        let body = response.body;
        let document = ctx
            .offload()
            .run(move || {
                let mut document: Map<String, Value> = serde_json::from_slice(&body)?;
                document.insert("viaAsyncHttpClient".to_string(), Value::String("true".to_string()));
                Ok::<_, serde_json::Error>(document)
            })
            .await?
            .map_err(|e| {
                ApiException::new(CoreApiError::OutsideDependencyReturnedAnUnrecoverableError)
                    .with_exception_message(format!("downstream body is not a JSON object: {}", e))
            })?;

        Ok(ResponseInfo::new(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DownstreamConfig;

    #[test]
    fn test_targets_local_example_endpoint() {
        let client = DownstreamClient::new(&DownstreamConfig::default()).unwrap();

        let plain = ExampleDownstreamHttpAsync::new(client.clone(), 8080, 8443, false).unwrap();
        assert_eq!(plain.downstream_url().as_str(), "http://127.0.0.1:8080/example");

        let secure = ExampleDownstreamHttpAsync::new(client, 8080, 8443, true).unwrap();
        assert_eq!(secure.downstream_url().as_str(), "https://127.0.0.1:8443/example");
    }
}
