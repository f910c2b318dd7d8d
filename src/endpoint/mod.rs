//! Endpoint contract.
//!
//! # Data Flow
//! ```text
//! RequestInfo<NoContent> (buffered body)
//!     → StandardHandler::handle
//!         → ValidationPipeline (typed input, all violations)
//!         → StandardEndpoint::execute (async, may offload)
//!         → ResponseInfo::render
//!
//! RequestInfo<NoContent> + streaming body
//!     → ProxyRouterEndpoint::first_chunk
//!     → downstream::proxy (streams both directions)
//! ```
//!
//! # Design Decisions
//! - Endpoints are async; blocking work goes through OffloadExecutor
//! - Exactly one completion per request: the returned future resolves once
//! - Typed endpoints are erased behind StandardHandler for the route table

pub mod context;
pub mod contract;
pub mod request;
pub mod response;

pub use context::{ExecutionContext, OffloadExecutor};
pub use contract::{EndpointBinding, Handler, ProxyRouterEndpoint, StandardEndpoint, StandardHandler};
pub use request::RequestInfo;
pub use response::{ResponseInfo, APPLICATION_JSON};
