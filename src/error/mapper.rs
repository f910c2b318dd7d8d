//! Error mapper: turns any request failure into the single error contract.
//!
//! # Data Flow
//! ```text
//! EndpointError
//!     ├─ Validation(violations) → resolve each name in catalog (+ "field" metadata)
//!     ├─ Api(exception)         → exception's errors, headers, log details
//!     └─ Unexpected(error)      → GENERIC_SERVICE_ERROR, error chain logged only
//!         → de-duplicate
//!         → status = highest status among errors
//!         → one log line keyed by error_id
//!         → ErrorContract JSON + error_uid header
//! ```

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::api_error::{ApiError, ApiErrorCatalog, CoreApiError};
use crate::error::exception::EndpointError;
use crate::validation::ValidationError;

/// Response header carrying the error id.
pub const ERROR_UID_HEADER: &str = "error_uid";

/// Wire format of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContract {
    pub error_id: String,
    pub errors: Vec<ErrorContractEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContractEntry {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Request coordinates used in the error log line.
#[derive(Debug, Clone, Copy)]
pub struct RequestSummary<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub request_id: &'a str,
}

/// Result of mapping one failure.
#[derive(Debug, Clone)]
pub struct MappedError {
    pub error_id: Uuid,
    pub status: StatusCode,
    pub errors: Vec<ApiError>,
    pub extra_headers: Vec<(String, Vec<String>)>,
}

impl MappedError {
    pub fn contract(&self) -> ErrorContract {
        ErrorContract {
            error_id: self.error_id.to_string(),
            errors: self
                .errors
                .iter()
                .map(|e| ErrorContractEntry {
                    code: e.code.to_string(),
                    message: e.message.to_string(),
                    metadata: e.metadata.clone(),
                })
                .collect(),
        }
    }
}

impl IntoResponse for MappedError {
    fn into_response(self) -> Response {
        let contract = self.contract();
        let mut response = (self.status, Json(contract)).into_response();
        let headers = response.headers_mut();

        if let Ok(value) = HeaderValue::from_str(&self.error_id.to_string()) {
            headers.insert(ERROR_UID_HEADER, value);
        }
        for (name, values) in &self.extra_headers {
            let Ok(name) = HeaderName::try_from(name.as_str()) else {
                tracing::warn!(header = %name, "Dropping invalid extra response header name");
                continue;
            };
            for value in values {
                match HeaderValue::from_str(value) {
                    Ok(value) => {
                        headers.append(name.clone(), value);
                    }
                    Err(_) => {
                        tracing::warn!(header = %name, "Dropping invalid extra response header value");
                    }
                }
            }
        }
        response
    }
}

/// Maps failures to responses. Shared read-only across requests.
#[derive(Debug, Clone)]
pub struct ErrorMapper {
    catalog: Arc<ApiErrorCatalog>,
}

impl ErrorMapper {
    pub fn new(catalog: Arc<ApiErrorCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ApiErrorCatalog {
        &self.catalog
    }

    /// Map a failure and log it once.
    pub fn map(&self, failure: &EndpointError, request: &RequestSummary<'_>) -> MappedError {
        let error_id = Uuid::new_v4();
        let mut extra_headers = Vec::new();
        let mut log_details = Vec::new();
        let mut cause: Option<String> = None;

        let errors = match failure {
            EndpointError::Validation(violations) => match self.resolve_violations(violations) {
                Ok(errors) => errors,
                Err(unknown) => {
                    cause = Some(format!(
                        "validation constraint references unknown ApiError name '{}'",
                        unknown
                    ));
                    vec![CoreApiError::GenericServiceError.api_error()]
                }
            },
            EndpointError::Api(exception) => {
                extra_headers = exception.extra_response_headers().to_vec();
                log_details = exception.log_details().to_vec();
                cause = exception.message().map(str::to_string);
                exception.errors().to_vec()
            }
            EndpointError::Unexpected(error) => {
                cause = Some(format!("{:#}", error));
                vec![CoreApiError::GenericServiceError.api_error()]
            }
        };

        let mut errors = dedup(errors);
        if errors.is_empty() {
            errors.push(CoreApiError::GenericServiceError.api_error());
        }
        let status = errors
            .iter()
            .map(|e| e.status)
            .max_by_key(|s| s.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mapped = MappedError {
            error_id,
            status,
            errors,
            extra_headers,
        };
        log_mapped(&mapped, failure, request, &log_details, cause.as_deref());
        mapped
    }

    /// Map a failure straight to a response.
    pub fn to_response(&self, failure: &EndpointError, request: &RequestSummary<'_>) -> Response {
        self.map(failure, request).into_response()
    }

    fn resolve_violations(&self, violations: &[ValidationError]) -> Result<Vec<ApiError>, String> {
        violations
            .iter()
            .map(|violation| {
                self.catalog
                    .find_by_name(violation.error_code)
                    .map(|error| {
                        error
                            .clone()
                            .with_metadata("field", violation.field_path.clone())
                    })
                    .ok_or_else(|| violation.error_code.to_string())
            })
            .collect()
    }
}

fn dedup(errors: Vec<ApiError>) -> Vec<ApiError> {
    let mut unique: Vec<ApiError> = Vec::with_capacity(errors.len());
    for error in errors {
        if !unique.contains(&error) {
            unique.push(error);
        }
    }
    unique
}

fn log_mapped(
    mapped: &MappedError,
    failure: &EndpointError,
    request: &RequestSummary<'_>,
    log_details: &[(String, String)],
    cause: Option<&str>,
) {
    let names = mapped
        .errors
        .iter()
        .map(|e| e.name)
        .collect::<Vec<_>>()
        .join(",");
    let details = log_details
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    let kind = match failure {
        EndpointError::Validation(_) => "validation",
        EndpointError::Api(_) => "api",
        EndpointError::Unexpected(_) => "unhandled",
    };

    if mapped.status.is_server_error() {
        tracing::error!(
            error_uid = %mapped.error_id,
            http_status = mapped.status.as_u16(),
            contributing_errors = %names,
            failure_kind = kind,
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            details = %details,
            cause = cause.unwrap_or(""),
            "Request failed"
        );
    } else {
        tracing::warn!(
            error_uid = %mapped.error_id,
            http_status = mapped.status.as_u16(),
            contributing_errors = %names,
            failure_kind = kind,
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            details = %details,
            cause = cause.unwrap_or(""),
            "Request rejected"
        );
    }
}
