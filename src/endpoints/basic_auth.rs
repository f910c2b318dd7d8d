//! `/exampleBasicAuth`: GET tells callers which header to send, POST is
//! the protected route.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};

use crate::endpoint::{ExecutionContext, RequestInfo, ResponseInfo, StandardEndpoint};
use crate::error::EndpointError;
use crate::routing::{Matcher, RouteError};
use crate::security::basic_auth_header_value;
use crate::validation::NoContent;

pub const MATCHING_PATH: &str = "/exampleBasicAuth";

#[derive(Debug, Clone)]
pub struct ExampleBasicAuthGet {
    header_value: String,
}

impl ExampleBasicAuthGet {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            header_value: basic_auth_header_value(username, password),
        }
    }
}

#[async_trait]
impl StandardEndpoint for ExampleBasicAuthGet {
    type Input = NoContent;
    type Output = BTreeMap<&'static str, String>;

    fn name(&self) -> &'static str {
        "example_basic_auth_get"
    }

    fn matcher(&self) -> Result<Matcher, RouteError> {
        Matcher::match_methods(MATCHING_PATH, [Method::GET])
    }

    async fn execute(
        &self,
        _request: RequestInfo<NoContent>,
        _ctx: &ExecutionContext,
    ) -> Result<ResponseInfo<BTreeMap<&'static str, String>>, EndpointError> {
        let mut body = BTreeMap::new();
        body.insert(
            "description",
            format!(
                "The following Authorization header can be used to call POST {} without a validation error.",
                MATCHING_PATH
            ),
        );
        body.insert("Authorization", self.header_value.clone());
        Ok(ResponseInfo::new(body))
    }
}

#[derive(Debug, Default)]
pub struct ExampleBasicAuthPost;

#[async_trait]
impl StandardEndpoint for ExampleBasicAuthPost {
    type Input = NoContent;
    type Output = &'static str;

    fn name(&self) -> &'static str {
        "example_basic_auth_post"
    }

    fn matcher(&self) -> Result<Matcher, RouteError> {
        Matcher::match_methods(MATCHING_PATH, [Method::POST])
    }

    async fn execute(
        &self,
        _request: RequestInfo<NoContent>,
        _ctx: &ExecutionContext,
    ) -> Result<ResponseInfo<&'static str>, EndpointError> {
        Ok(ResponseInfo::new("Successful Basic Auth call")
            .with_status(StatusCode::CREATED)
            .with_mime_type("text/plain"))
    }
}
