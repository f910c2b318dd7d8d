//! Endpoint traits and their type-erased form stored in the route table.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use serde::Serialize;

use crate::downstream::DownstreamFirstChunk;
use crate::endpoint::context::ExecutionContext;
use crate::endpoint::request::RequestInfo;
use crate::endpoint::response::ResponseInfo;
use crate::error::EndpointError;
use crate::routing::{Matcher, RouteError};
use crate::validation::{Constraint, NoContent, RequestContent, ValidationPipeline};

/// An endpoint that receives a fully buffered, decoded request and returns
/// a response.
///
/// `execute` must not block: slow synchronous work goes through
/// [`ExecutionContext::offload`].
#[async_trait]
pub trait StandardEndpoint: Send + Sync + 'static {
    type Input: RequestContent;
    type Output: Serialize + Send + 'static;

    /// Unique name, used in logs, metrics and security configuration.
    fn name(&self) -> &'static str;

    fn matcher(&self) -> Result<Matcher, RouteError>;

    /// Run the declared constraints before `execute`.
    fn validate_request_content(&self) -> bool {
        true
    }

    /// Never consult the security gate for this endpoint.
    fn security_exempt(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        request: RequestInfo<Self::Input>,
        ctx: &ExecutionContext,
    ) -> Result<ResponseInfo<Self::Output>, EndpointError>;
}

/// An endpoint that forwards the request to another service and streams
/// the answer back.
///
/// The endpoint only decides the first chunk (target, method, headers, TLS
/// mode); bodies in both directions are streamed by the proxy machinery.
#[async_trait]
pub trait ProxyRouterEndpoint: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn matcher(&self) -> Result<Matcher, RouteError>;

    fn security_exempt(&self) -> bool {
        false
    }

    async fn first_chunk(
        &self,
        request: &RequestInfo<NoContent>,
        ctx: &ExecutionContext,
    ) -> Result<DownstreamFirstChunk, EndpointError>;
}

/// Object-safe face of a [`StandardEndpoint`].
#[async_trait]
pub trait StandardHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn security_exempt(&self) -> bool;

    /// Constraints evaluated on this endpoint's input.
    fn constraints(&self) -> &'static [Constraint];

    /// Validate, execute and render.
    async fn handle(
        &self,
        request: RequestInfo<NoContent>,
        ctx: &ExecutionContext,
    ) -> Result<Response<Body>, EndpointError>;
}

struct StandardAdapter<E>(E);

#[async_trait]
impl<E: StandardEndpoint> StandardHandler for StandardAdapter<E> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn security_exempt(&self) -> bool {
        self.0.security_exempt()
    }

    fn constraints(&self) -> &'static [Constraint] {
        <E::Input as RequestContent>::CONSTRAINTS
    }

    async fn handle(
        &self,
        request: RequestInfo<NoContent>,
        ctx: &ExecutionContext,
    ) -> Result<Response<Body>, EndpointError> {
        let content = ValidationPipeline::run::<E::Input>(
            &request.raw_body,
            self.0.validate_request_content(),
        )?;
        let response = self.0.execute(request.with_content(content), ctx).await?;
        response.render()
    }
}

/// What a route points at.
#[derive(Clone)]
pub enum Handler {
    Standard(Arc<dyn StandardHandler>),
    Proxy(Arc<dyn ProxyRouterEndpoint>),
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Standard(h) => h.name(),
            Handler::Proxy(p) => p.name(),
        }
    }

    pub fn security_exempt(&self) -> bool {
        match self {
            Handler::Standard(h) => h.security_exempt(),
            Handler::Proxy(p) => p.security_exempt(),
        }
    }

    pub fn constraints(&self) -> &'static [Constraint] {
        match self {
            Handler::Standard(h) => h.constraints(),
            Handler::Proxy(_) => &[],
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Standard(h) => write!(f, "Standard({})", h.name()),
            Handler::Proxy(p) => write!(f, "Proxy({})", p.name()),
        }
    }
}

/// An endpoint ready to be registered: its matcher plus its handler.
#[derive(Debug)]
pub struct EndpointBinding {
    pub matcher: Matcher,
    pub handler: Handler,
}

impl EndpointBinding {
    pub fn standard<E: StandardEndpoint>(endpoint: E) -> Result<Self, RouteError> {
        Ok(Self {
            matcher: endpoint.matcher()?,
            handler: Handler::Standard(Arc::new(StandardAdapter(endpoint))),
        })
    }

    pub fn proxy<P: ProxyRouterEndpoint>(endpoint: P) -> Result<Self, RouteError> {
        Ok(Self {
            matcher: endpoint.matcher()?,
            handler: Handler::Proxy(Arc::new(endpoint)),
        })
    }
}
