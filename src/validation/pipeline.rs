//! Request body decoding and validation, run before any endpoint executes.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiException, CoreApiError, EndpointError};
use crate::validation::constraint::{check_all, Constraint};

/// A type an endpoint can receive as its request content.
///
/// Implemented explicitly per input type; the constraint table is what the
/// pipeline evaluates when validation is on.
pub trait RequestContent: DeserializeOwned + Send + 'static {
    /// Whether a body is expected at all.
    const EXPECTED: bool = true;

    /// Field constraints, each naming the ApiError it reports.
    const CONSTRAINTS: &'static [Constraint] = &[];
}

/// Input shape of endpoints that ignore the request body.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NoContent;

impl RequestContent for NoContent {
    const EXPECTED: bool = false;
}

/// Untyped JSON input for endpoints that pass documents through.
impl RequestContent for Value {}

pub struct ValidationPipeline;

impl ValidationPipeline {
    /// Decode `raw` into `T`, checking every constraint first when
    /// `validate` is set.
    ///
    /// A missing body is `MISSING_EXPECTED_CONTENT`, unparseable JSON is
    /// `MALFORMED_REQUEST`, and a document that passes validation but does
    /// not fit `T` is `TYPE_CONVERSION_ERROR`.
    pub fn run<T: RequestContent>(raw: &[u8], validate: bool) -> Result<T, EndpointError> {
        if !T::EXPECTED {
            return serde_json::from_value(Value::Null)
                .map_err(|e| EndpointError::Unexpected(e.into()));
        }

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiException::new(CoreApiError::MissingExpectedContent)
                .with_exception_message("request body required but missing")
                .into());
        }

        let document: Value = serde_json::from_slice(raw).map_err(|e| {
            EndpointError::Api(
                ApiException::new(CoreApiError::MalformedRequest)
                    .with_exception_message(format!("unparseable JSON body: {}", e)),
            )
        })?;

        if validate {
            let violations = check_all(T::CONSTRAINTS, &document);
            if !violations.is_empty() {
                return Err(EndpointError::Validation(violations));
            }
        }

        serde_json::from_value(document).map_err(|e| {
            EndpointError::Api(
                ApiException::new(CoreApiError::TypeConversionError)
                    .with_exception_message(format!("body does not match expected shape: {}", e)),
            )
        })
    }
}
