//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup, most specific first)
//!     → matcher.rs (evaluate path pattern and method set)
//!     → Return: Matched route | MethodNotAllowed | NoMatch
//!
//! Route Compilation (at startup):
//!     endpoint matchers
//!     → parse patterns
//!     → reject overlapping (pattern, method) pairs
//!     → freeze as immutable RouteTable shared via Arc
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::{Matcher, MethodSet, PathParams, PathPattern};
pub use router::{Resolution, Route, RouteId, RouteMatch, RouteTable};

/// Route registration errors. All of them abort startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route '{new}' overlaps already registered route '{existing}'")]
    Conflict { existing: String, new: String },
}
