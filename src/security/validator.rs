//! Request security validators.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::error::{ApiException, CoreApiError};

/// Decides whether a request may reach a protected endpoint.
///
/// Runs before the request body is read or validated.
pub trait RequestSecurityValidator: Send + Sync + std::fmt::Debug {
    fn validate(&self, headers: &HeaderMap) -> Result<(), ApiException>;
}

/// `Basic base64(username:password)`.
pub fn basic_auth_header_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// Accepts exactly one `Authorization: Basic ...` value.
pub struct BasicAuthValidator {
    expected: String,
}

impl std::fmt::Debug for BasicAuthValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthValidator").finish_non_exhaustive()
    }
}

impl BasicAuthValidator {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            expected: basic_auth_header_value(username, password),
        }
    }
}

impl RequestSecurityValidator for BasicAuthValidator {
    fn validate(&self, headers: &HeaderMap) -> Result<(), ApiException> {
        let Some(provided) = headers.get(header::AUTHORIZATION) else {
            return Err(ApiException::new(CoreApiError::Unauthorized)
                .with_exception_message("missing Authorization header"));
        };

        if bool::from(provided.as_bytes().ct_eq(self.expected.as_bytes())) {
            Ok(())
        } else {
            Err(ApiException::new(CoreApiError::Unauthorized)
                .with_exception_message("Authorization header does not match"))
        }
    }
}
