//! Validation subsystem.
//!
//! # Data Flow
//! ```text
//! raw body bytes
//!     → pipeline.rs (missing? malformed?)
//!     → constraint.rs (every declared constraint, all violations collected)
//!     → typed input, or EndpointError::Validation(violations)
//! ```
//!
//! # Design Decisions
//! - Constraints run on the JSON document, so missing fields are reported
//!   as violations rather than as a deserialization failure
//! - Each constraint names an ApiError; names are checked against the
//!   catalog at startup

pub mod constraint;
pub mod pipeline;

pub use constraint::{check_all, is_uuid, Constraint, Rule, ValidationError};
pub use pipeline::{NoContent, RequestContent, ValidationPipeline};
