//! Endpoint response builder and rendering.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::EndpointError;

pub const APPLICATION_JSON: &str = "application/json";

/// What an endpoint hands back: status (200 unless set), headers, optional
/// content, and the mime type to render it with.
#[derive(Debug, Clone)]
pub struct ResponseInfo<T> {
    status: StatusCode,
    headers: HeaderMap,
    content: Option<T>,
    mime_type: Option<String>,
}

impl<T> ResponseInfo<T> {
    pub fn new(content: T) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            content: Some(content),
            mime_type: None,
        }
    }

    /// A response without a body.
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            content: None,
            mime_type: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content(&self) -> Option<&T> {
        self.content.as_ref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

impl<T: Serialize> ResponseInfo<T> {
    /// Serialize into an HTTP response.
    ///
    /// JSON mime types (the default) serialize the content as JSON. For any
    /// other mime type a string content is written verbatim.
    pub fn render(self) -> Result<Response<Body>, EndpointError> {
        let mime = self.mime_type.unwrap_or_else(|| APPLICATION_JSON.to_string());

        let body = match self.content {
            None => Body::empty(),
            Some(content) => {
                let value = serde_json::to_value(&content)
                    .map_err(|e| EndpointError::Unexpected(e.into()))?;
                match value {
                    Value::String(text) if !mime.contains("json") => Body::from(text),
                    other => Body::from(
                        serde_json::to_vec(&other).map_err(|e| EndpointError::Unexpected(e.into()))?,
                    ),
                }
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        headers.extend(self.headers);
        if !headers.contains_key(header::CONTENT_TYPE) {
            let value = HeaderValue::from_str(&mime).map_err(|e| EndpointError::Unexpected(e.into()))?;
            headers.insert(header::CONTENT_TYPE, value);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_render_defaults() {
        let response = ResponseInfo::new(json!({"a": 1})).render().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(body_text(response).await, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_text_render_is_verbatim() {
        let response = ResponseInfo::new("Successful Basic Auth call".to_string())
            .with_status(StatusCode::CREATED)
            .with_mime_type("text/plain")
            .render()
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(body_text(response).await, "Successful Basic Auth call");
    }

    #[tokio::test]
    async fn test_empty_response_has_no_body() {
        let response = ResponseInfo::<()>::empty()
            .with_header(HeaderName::from_static("x-extra"), HeaderValue::from_static("1"))
            .render()
            .unwrap();
        assert_eq!(response.headers()["x-extra"], "1");
        assert_eq!(body_text(response).await, "");
    }
}
