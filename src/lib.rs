//! Microservice template library.
//!
//! Every request goes through one dispatcher: route table lookup, the
//! optional security gate, the endpoint (standard or proxy), and the error
//! mapper. Components are assembled once at startup into an immutable
//! [`ServerConfigSnapshot`].

// Request pipeline
pub mod endpoint;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod routing;
pub mod validation;

// Downstream calls
pub mod downstream;

// Assembly and optional components
pub mod components;
pub mod config;
pub mod registry;
pub mod security;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use components::{ComponentAssembly, ServerConfigSnapshot};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
