//! Error model and error-to-response mapping.
//!
//! # Data Flow
//! ```text
//! Route miss / auth deny / validation / handler failure
//!     → EndpointError (exception.rs)
//!     → ErrorMapper (mapper.rs), resolving names via ApiErrorCatalog (api_error.rs)
//!     → ErrorContract response
//! ```
//!
//! # Design Decisions
//! - Every failure path ends in the mapper exactly once
//! - Unexpected failures never leak internals to the caller
//! - Validation constraints reference errors by name; the catalog is the only resolver

pub mod api_error;
pub mod exception;
pub mod mapper;

pub use api_error::{ApiError, ApiErrorCatalog, CoreApiError, ProjectApiError};
pub use exception::{ApiException, EndpointError};
pub use mapper::{ErrorContract, ErrorContractEntry, ErrorMapper, MappedError, RequestSummary, ERROR_UID_HEADER};
