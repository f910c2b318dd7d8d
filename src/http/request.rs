//! Request id helpers.
//!
//! The id is set by `SetRequestIdLayer` as early as possible, echoed back
//! by `PropagateRequestIdLayer`, and read here for logging.

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request id carried on `headers`, or `"unknown"` if none was set.
pub fn request_id_of(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
