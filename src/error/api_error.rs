//! API error definitions and the error catalog.
//!
//! An [`ApiError`] is the unit the error contract is built from: a stable
//! name used internally (and by validation constraints), a client-facing
//! code and message, an HTTP status, and metadata. Errors are declared as
//! enums ([`CoreApiError`], [`ProjectApiError`]) and collected into an
//! [`ApiErrorCatalog`] once at startup.

use std::collections::HashMap;

use axum::http::StatusCode;
use serde_json::{Map, Value};

/// A resolved API error, optionally carrying per-occurrence metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Stable identifier, e.g. `EXAMPLE_ERROR_BAD_INPUT_VAL_1`.
    pub name: &'static str,
    /// Client-facing error code.
    pub code: &'static str,
    pub message: &'static str,
    pub status: StatusCode,
    /// Static metadata merged with any dynamic metadata added later.
    pub metadata: Map<String, Value>,
}

impl ApiError {
    fn declared(
        name: &'static str,
        code: &'static str,
        message: &'static str,
        status: StatusCode,
    ) -> Self {
        Self {
            name,
            code,
            message,
            status,
            metadata: Map::new(),
        }
    }

    /// Add a metadata entry, replacing a static entry with the same key.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Errors every service built from this template shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreApiError {
    GenericServiceError,
    OutsideDependencyReturnedAnUnrecoverableError,
    ServersideValidationError,
    TemporaryServiceProblem,
    OutsideDependencyReturnedATemporaryError,
    GenericBadRequest,
    MissingExpectedContent,
    TypeConversionError,
    MalformedRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NoAcceptableRepresentation,
    UnsupportedMediaType,
    TooManyRequests,
}

impl CoreApiError {
    pub const ALL: [CoreApiError; 16] = [
        CoreApiError::GenericServiceError,
        CoreApiError::OutsideDependencyReturnedAnUnrecoverableError,
        CoreApiError::ServersideValidationError,
        CoreApiError::TemporaryServiceProblem,
        CoreApiError::OutsideDependencyReturnedATemporaryError,
        CoreApiError::GenericBadRequest,
        CoreApiError::MissingExpectedContent,
        CoreApiError::TypeConversionError,
        CoreApiError::MalformedRequest,
        CoreApiError::Unauthorized,
        CoreApiError::Forbidden,
        CoreApiError::NotFound,
        CoreApiError::MethodNotAllowed,
        CoreApiError::NoAcceptableRepresentation,
        CoreApiError::UnsupportedMediaType,
        CoreApiError::TooManyRequests,
    ];

    pub fn api_error(self) -> ApiError {
        use CoreApiError::*;
        let (name, code, message, status) = match self {
            GenericServiceError => (
                "GENERIC_SERVICE_ERROR",
                "10",
                "An error occurred while fulfilling the request",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            OutsideDependencyReturnedAnUnrecoverableError => (
                "OUTSIDE_DEPENDENCY_RETURNED_AN_UNRECOVERABLE_ERROR",
                "20",
                "An error occurred while fulfilling the request",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            ServersideValidationError => (
                "SERVERSIDE_VALIDATION_ERROR",
                "30",
                "An error occurred while fulfilling the request",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            TemporaryServiceProblem => (
                "TEMPORARY_SERVICE_PROBLEM",
                "40",
                "A temporary error occurred. The request may be retried",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            OutsideDependencyReturnedATemporaryError => (
                "OUTSIDE_DEPENDENCY_RETURNED_A_TEMPORARY_ERROR",
                "50",
                "A temporary error occurred. The request may be retried",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            GenericBadRequest => (
                "GENERIC_BAD_REQUEST",
                "60",
                "Invalid request",
                StatusCode::BAD_REQUEST,
            ),
            MissingExpectedContent => (
                "MISSING_EXPECTED_CONTENT",
                "61",
                "Missing expected content",
                StatusCode::BAD_REQUEST,
            ),
            TypeConversionError => (
                "TYPE_CONVERSION_ERROR",
                "62",
                "Type conversion error",
                StatusCode::BAD_REQUEST,
            ),
            MalformedRequest => (
                "MALFORMED_REQUEST",
                "63",
                "Malformed request",
                StatusCode::BAD_REQUEST,
            ),
            Unauthorized => (
                "UNAUTHORIZED",
                "70",
                "Unauthorized access",
                StatusCode::UNAUTHORIZED,
            ),
            Forbidden => ("FORBIDDEN", "71", "Forbidden access", StatusCode::FORBIDDEN),
            NotFound => (
                "NOT_FOUND",
                "80",
                "The requested resource was not found",
                StatusCode::NOT_FOUND,
            ),
            MethodNotAllowed => (
                "METHOD_NOT_ALLOWED",
                "90",
                "Http Request method not allowed for this resource",
                StatusCode::METHOD_NOT_ALLOWED,
            ),
            NoAcceptableRepresentation => (
                "NO_ACCEPTABLE_REPRESENTATION",
                "91",
                "No acceptable representation for this resource",
                StatusCode::NOT_ACCEPTABLE,
            ),
            UnsupportedMediaType => (
                "UNSUPPORTED_MEDIA_TYPE",
                "92",
                "Unsupported media type",
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            TooManyRequests => (
                "TOO_MANY_REQUESTS",
                "93",
                "Too many requests",
                StatusCode::TOO_MANY_REQUESTS,
            ),
        };
        ApiError::declared(name, code, message, status)
    }
}

/// Errors specific to this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectApiError {
    ExampleErrorBadInputVal1,
    ExampleErrorBadInputVal2,
    ExampleErrorManuallyThrown,
}

impl ProjectApiError {
    pub const ALL: [ProjectApiError; 3] = [
        ProjectApiError::ExampleErrorBadInputVal1,
        ProjectApiError::ExampleErrorBadInputVal2,
        ProjectApiError::ExampleErrorManuallyThrown,
    ];

    pub const EXAMPLE_ERROR_BAD_INPUT_VAL_1: &'static str = "EXAMPLE_ERROR_BAD_INPUT_VAL_1";
    pub const EXAMPLE_ERROR_BAD_INPUT_VAL_2: &'static str = "EXAMPLE_ERROR_BAD_INPUT_VAL_2";
    pub const EXAMPLE_ERROR_MANUALLY_THROWN: &'static str = "EXAMPLE_ERROR_MANUALLY_THROWN";

    pub fn api_error(self) -> ApiError {
        match self {
            ProjectApiError::ExampleErrorBadInputVal1 => ApiError::declared(
                Self::EXAMPLE_ERROR_BAD_INPUT_VAL_1,
                "99150",
                "Bad request body - null/empty input_val_1",
                StatusCode::BAD_REQUEST,
            ),
            ProjectApiError::ExampleErrorBadInputVal2 => ApiError::declared(
                Self::EXAMPLE_ERROR_BAD_INPUT_VAL_2,
                "99151",
                "Bad request body - null/empty input_val_2",
                StatusCode::BAD_REQUEST,
            ),
            ProjectApiError::ExampleErrorManuallyThrown => ApiError::declared(
                Self::EXAMPLE_ERROR_MANUALLY_THROWN,
                "99152",
                "You asked for an error to be thrown",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .with_metadata("static_metadata_1", "foo")
            .with_metadata("static_metadata_2", 42),
        }
    }
}

impl From<CoreApiError> for ApiError {
    fn from(error: CoreApiError) -> Self {
        error.api_error()
    }
}

impl From<ProjectApiError> for ApiError {
    fn from(error: ProjectApiError) -> Self {
        error.api_error()
    }
}

/// Every error this service can emit, indexed by name.
#[derive(Debug, Clone)]
pub struct ApiErrorCatalog {
    by_name: HashMap<&'static str, ApiError>,
}

impl ApiErrorCatalog {
    /// Build the catalog from the core and project error sets.
    pub fn new() -> Self {
        let by_name = CoreApiError::ALL
            .iter()
            .map(|e| e.api_error())
            .chain(ProjectApiError::ALL.iter().map(|e| e.api_error()))
            .map(|e| (e.name, e))
            .collect();
        Self { by_name }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ApiError> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ApiError> {
        self.by_name.values()
    }
}

impl Default for ApiErrorCatalog {
    fn default() -> Self {
        Self::new()
    }
}
