//! The endpoints this service ships with.
//!
//! | name                            | path                          | methods |
//! |---------------------------------|-------------------------------|---------|
//! | `health_check`                  | `/healthcheck`                | all     |
//! | `example_get`                   | `/example`                    | GET     |
//! | `example_post`                  | `/example`                    | POST    |
//! | `example_downstream_http_async` | `/exampleDownstreamHttpAsync` | all     |
//! | `example_proxy`                 | `/exampleProxy`               | all     |
//! | `example_basic_auth_get`        | `/exampleBasicAuth`           | GET     |
//! | `example_basic_auth_post`       | `/exampleBasicAuth`           | POST    |
//!
//! Both downstream examples call `/example` on this same server, over
//! TLS when `endpoints.use_ssl` is set.

pub mod basic_auth;
pub mod downstream_async;
pub mod example;
pub mod health;
pub mod proxy;

use crate::components::AssemblyError;
use crate::config::AppConfig;
use crate::downstream::DownstreamClient;
use crate::endpoint::EndpointBinding;

pub use basic_auth::{ExampleBasicAuthGet, ExampleBasicAuthPost};
pub use downstream_async::ExampleDownstreamHttpAsync;
pub use example::{ErrorHandlingEndpointArgs, ExampleGet, ExamplePost};
pub use health::HealthCheckEndpoint;
pub use proxy::ExampleProxyRouter;

/// Bindings for every application endpoint.
pub fn app_endpoints(config: &AppConfig, client: &DownstreamClient) -> Result<Vec<EndpointBinding>, AssemblyError> {
    let endpoints = &config.endpoints;
    let credentials = &config.example_basic_auth;

    Ok(vec![
        EndpointBinding::standard(HealthCheckEndpoint)?,
        EndpointBinding::standard(ExampleGet)?,
        EndpointBinding::standard(ExamplePost)?,
        EndpointBinding::standard(ExampleDownstreamHttpAsync::new(
            client.clone(),
            endpoints.port,
            endpoints.ssl_port,
            endpoints.use_ssl,
        )?)?,
        EndpointBinding::proxy(ExampleProxyRouter::new(
            endpoints.port,
            endpoints.ssl_port,
            endpoints.use_ssl,
        ))?,
        EndpointBinding::standard(ExampleBasicAuthGet::new(&credentials.username, &credentials.password))?,
        EndpointBinding::standard(ExampleBasicAuthPost)?,
    ])
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DownstreamConfig;
    use crate::error::ApiErrorCatalog;

    #[test]
    fn test_constraint_errors_are_in_catalog() {
        let client = DownstreamClient::new(&DownstreamConfig::default()).unwrap();
        let catalog = ApiErrorCatalog::new();
        for binding in app_endpoints(&AppConfig::default(), &client).unwrap() {
            for constraint in binding.handler.constraints() {
                assert!(
                    catalog.contains(constraint.error),
                    "{} uses unknown error {}",
                    binding.handler.name(),
                    constraint.error
                );
            }
        }
    }

    #[test]
    fn test_names_are_unique() {
        let client = DownstreamClient::new(&DownstreamConfig::default()).unwrap();
        let mut names: Vec<_> = app_endpoints(&AppConfig::default(), &client)
            .unwrap()
            .iter()
            .map(|b| b.handler.name())
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
