//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → route resolved
//!     → gate.rs (is the route protected? skip exempt handlers)
//!     → validator.rs (check credentials, e.g. basic auth)
//!     → body read, validation pipeline, endpoint
//! ```
//!
//! # Design Decisions
//! - Fail closed: a protected route with bad or missing credentials gets
//!   401 before its body is read
//! - The validator is optional; without one nothing is gated
//! - Credential comparison is constant-time

pub mod gate;
pub mod validator;

pub use gate::{resolve_protected_routes, SecurityGate};
pub use validator::{basic_auth_header_value, BasicAuthValidator, RequestSecurityValidator};
