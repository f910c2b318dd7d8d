//! `/example`: automatic validation on POST and a manually raised error.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::endpoint::{ExecutionContext, RequestInfo, ResponseInfo, StandardEndpoint};
use crate::error::{ApiException, EndpointError, ProjectApiError};
use crate::routing::{Matcher, RouteError};
use crate::validation::{Constraint, NoContent, RequestContent};

pub const MATCHING_PATH: &str = "/example";

/// Payload of both `/example` methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandlingEndpointArgs {
    pub input_val_1: Option<String>,
    pub input_val_2: Option<String>,
    #[serde(rename = "throwManualError", default)]
    pub throw_manual_error: Option<bool>,
}

impl RequestContent for ErrorHandlingEndpointArgs {
    const CONSTRAINTS: &'static [Constraint] = &[
        Constraint::not_blank("input_val_1", ProjectApiError::EXAMPLE_ERROR_BAD_INPUT_VAL_1),
        Constraint::not_blank("input_val_2", ProjectApiError::EXAMPLE_ERROR_BAD_INPUT_VAL_2),
    ];
}

/// Returns freshly generated sample args.
#[derive(Debug, Default)]
pub struct ExampleGet;

#[async_trait]
impl StandardEndpoint for ExampleGet {
    type Input = NoContent;
    type Output = ErrorHandlingEndpointArgs;

    fn name(&self) -> &'static str {
        "example_get"
    }

    fn matcher(&self) -> Result<Matcher, RouteError> {
        Matcher::match_methods(MATCHING_PATH, [Method::GET])
    }

    async fn execute(
        &self,
        _request: RequestInfo<NoContent>,
        _ctx: &ExecutionContext,
    ) -> Result<ResponseInfo<ErrorHandlingEndpointArgs>, EndpointError> {
        Ok(ResponseInfo::new(ErrorHandlingEndpointArgs {
            input_val_1: Some(format!("some-val1-{}", Uuid::new_v4())),
            input_val_2: Some(format!("some-val2-{}", Uuid::new_v4())),
            throw_manual_error: Some(false),
        }))
    }
}

/// Echoes valid args with 201, or fails on request.
#[derive(Debug, Default)]
pub struct ExamplePost;

#[async_trait]
impl StandardEndpoint for ExamplePost {
    type Input = ErrorHandlingEndpointArgs;
    type Output = ErrorHandlingEndpointArgs;

    fn name(&self) -> &'static str {
        "example_post"
    }

    fn matcher(&self) -> Result<Matcher, RouteError> {
        Matcher::match_methods(MATCHING_PATH, [Method::POST])
    }

    async fn execute(
        &self,
        request: RequestInfo<ErrorHandlingEndpointArgs>,
        _ctx: &ExecutionContext,
    ) -> Result<ResponseInfo<ErrorHandlingEndpointArgs>, EndpointError> {
        let content = request.content;

        if content.throw_manual_error == Some(true) {
            let now_millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default();
            return Err(ApiException::new(
                ProjectApiError::ExampleErrorManuallyThrown
                    .api_error()
                    .with_metadata("dynamic_metadata", now_millis),
            )
            .with_exception_message("Manual error throw was requested")
            .with_log_detail("some_important_log_info", "foo")
            .with_extra_response_header("useful-error-related-response-header", ["foo"])
            .into());
        }

        Ok(ResponseInfo::new(content).with_status(StatusCode::CREATED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_support::{context, request};
    use crate::validation::ValidationPipeline;

    #[tokio::test]
    async fn test_get_generates_sample_values() {
        let response = ExampleGet
            .execute(request(Method::GET, MATCHING_PATH, NoContent), &context())
            .await
            .unwrap();
        let args = response.content().unwrap();
        assert!(args.input_val_1.as_deref().unwrap().starts_with("some-val1-"));
        assert!(args.input_val_2.as_deref().unwrap().starts_with("some-val2-"));
        assert_eq!(args.throw_manual_error, Some(false));
    }

    #[tokio::test]
    async fn test_post_echoes_with_created() {
        let args = ErrorHandlingEndpointArgs {
            input_val_1: Some("a".into()),
            input_val_2: Some("b".into()),
            throw_manual_error: None,
        };
        let response = ExamplePost
            .execute(request(Method::POST, MATCHING_PATH, args.clone()), &context())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.content(), Some(&args));
    }

    #[tokio::test]
    async fn test_post_manual_error() {
        let args = ErrorHandlingEndpointArgs {
            input_val_1: Some("a".into()),
            input_val_2: Some("b".into()),
            throw_manual_error: Some(true),
        };
        let err = ExamplePost
            .execute(request(Method::POST, MATCHING_PATH, args), &context())
            .await
            .unwrap_err();
        let EndpointError::Api(exception) = err else {
            panic!("expected an ApiException");
        };
        let error = &exception.errors()[0];
        assert_eq!(error.name, ProjectApiError::EXAMPLE_ERROR_MANUALLY_THROWN);
        assert!(error.metadata.contains_key("dynamic_metadata"));
        assert_eq!(exception.log_details()[0], ("some_important_log_info".into(), "foo".into()));
        assert_eq!(exception.extra_response_headers()[0].0, "useful-error-related-response-header");
    }

    #[test]
    fn test_blank_inputs_report_both_errors() {
        let err = ValidationPipeline::run::<ErrorHandlingEndpointArgs>(
            br#"{"input_val_1":" ","throwManualError":false}"#,
            true,
        )
        .unwrap_err();
        let EndpointError::Validation(violations) = err else {
            panic!("expected validation errors");
        };
        let codes: Vec<_> = violations.iter().map(|v| v.error_code).collect();
        assert_eq!(
            codes,
            vec![
                ProjectApiError::EXAMPLE_ERROR_BAD_INPUT_VAL_1,
                ProjectApiError::EXAMPLE_ERROR_BAD_INPUT_VAL_2
            ]
        );
    }
}
