//! Liveness probe.

use async_trait::async_trait;

use crate::endpoint::{ExecutionContext, RequestInfo, ResponseInfo, StandardEndpoint};
use crate::error::EndpointError;
use crate::routing::{Matcher, RouteError};
use crate::validation::NoContent;

pub const MATCHING_PATH: &str = "/healthcheck";

/// Answers 200 with no body on any method. Never gated.
#[derive(Debug, Default)]
pub struct HealthCheckEndpoint;

#[async_trait]
impl StandardEndpoint for HealthCheckEndpoint {
    type Input = NoContent;
    type Output = ();

    fn name(&self) -> &'static str {
        "health_check"
    }

    fn matcher(&self) -> Result<Matcher, RouteError> {
        Matcher::match_all_methods(MATCHING_PATH)
    }

    fn security_exempt(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        _request: RequestInfo<NoContent>,
        _ctx: &ExecutionContext,
    ) -> Result<ResponseInfo<()>, EndpointError> {
        Ok(ResponseInfo::empty())
    }
}
