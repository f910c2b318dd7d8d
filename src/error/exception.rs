//! Failures raised while handling a request.

use crate::error::api_error::{ApiError, CoreApiError, ProjectApiError};
use crate::validation::ValidationError;

/// A domain failure: one or more API errors plus context for the response
/// and for the logs.
///
/// Build with [`ApiException::new`] and the `with_*` methods.
#[derive(Debug, Clone)]
pub struct ApiException {
    errors: Vec<ApiError>,
    extra_response_headers: Vec<(String, Vec<String>)>,
    log_details: Vec<(String, String)>,
    message: Option<String>,
}

impl ApiException {
    pub fn new(error: impl Into<ApiError>) -> Self {
        Self {
            errors: vec![error.into()],
            extra_response_headers: Vec::new(),
            log_details: Vec::new(),
            message: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<ApiError>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Internal message, logged but never sent to the caller.
    pub fn with_exception_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_extra_response_header(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.extra_response_headers
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Key/value pair that only appears in the error log line.
    pub fn with_log_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.log_details.push((key.into(), value.into()));
        self
    }

    pub fn errors(&self) -> &[ApiError] {
        &self.errors
    }

    pub fn extra_response_headers(&self) -> &[(String, Vec<String>)] {
        &self.extra_response_headers
    }

    pub fn log_details(&self) -> &[(String, String)] {
        &self.log_details
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl std::fmt::Display for ApiException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.errors.iter().map(|e| e.name).collect();
        write!(f, "ApiException[{}]", names.join(","))?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiException {}

impl From<CoreApiError> for ApiException {
    fn from(error: CoreApiError) -> Self {
        ApiException::new(error)
    }
}

impl From<ProjectApiError> for ApiException {
    fn from(error: ProjectApiError) -> Self {
        ApiException::new(error)
    }
}

/// Everything an endpoint (or the pipeline in front of it) can fail with.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Request content broke one or more declared constraints.
    #[error("request content failed validation ({} violation(s))", .0.len())]
    Validation(Vec<ValidationError>),

    /// A failure with a declared API error.
    #[error(transparent)]
    Api(#[from] ApiException),

    /// Anything else. Mapped to a generic 500 and logged in full.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<CoreApiError> for EndpointError {
    fn from(error: CoreApiError) -> Self {
        EndpointError::Api(error.into())
    }
}

impl From<ProjectApiError> for EndpointError {
    fn from(error: ProjectApiError) -> Self {
        EndpointError::Api(error.into())
    }
}
