//! Builds the server configuration snapshot from an [`AppConfig`].

use std::sync::Arc;
use std::time::Duration;

use crate::components::{Capability, ComponentRegistry};
use crate::config::validation::{validate_config, ValidationError};
use crate::config::{AppConfig, AppInfoConfig, DebugConfig, EndpointsConfig, ServerConfig};
use crate::downstream::{DownstreamClient, DownstreamError};
use crate::endpoint::{EndpointBinding, Handler, OffloadExecutor};
use crate::endpoints::app_endpoints;
use crate::error::{ApiErrorCatalog, ErrorMapper};
use crate::observability::metrics::{
    MetricsCollector, MetricsComponents, MetricsEngine, MetricsError, MetricsListener, ReporterFactory,
};
use crate::registry::{RegistryError, ServiceRegistryHooks};
use crate::routing::{RouteError, RouteTable};
use crate::security::{resolve_protected_routes, BasicAuthValidator, SecurityGate};

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("invalid configuration: {}", join(.0))]
    Config(Vec<ValidationError>),

    #[error("route table: {0}")]
    Route(#[from] RouteError),

    #[error("metrics: {0}")]
    Metrics(#[from] MetricsError),

    #[error("downstream client: {0}")]
    Downstream(#[from] DownstreamError),

    #[error("downstream url: {0}")]
    DownstreamUrl(#[from] url::ParseError),

    #[error("service registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("endpoint {endpoint}: constraint on {field} references unknown error {name}")]
    UnknownErrorName {
        endpoint: &'static str,
        field: &'static str,
        name: &'static str,
    },

    #[error("security protection names unknown endpoint {0:?}")]
    UnknownProtectedEndpoint(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything the server needs, resolved once and shared read-only.
#[derive(Debug)]
pub struct ServerConfigSnapshot {
    pub app: AppInfoConfig,
    pub endpoints: EndpointsConfig,
    pub server: ServerConfig,
    pub debug: DebugConfig,
    pub routes: Arc<RouteTable<Handler>>,
    pub components: ComponentRegistry,
    pub error_mapper: ErrorMapper,
    pub downstream: DownstreamClient,
    pub offload: OffloadExecutor,
}

impl ServerConfigSnapshot {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

/// Ordered construction of a [`ServerConfigSnapshot`].
pub struct ComponentAssembly {
    config: AppConfig,
    extra_endpoints: Vec<EndpointBinding>,
}

impl ComponentAssembly {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            extra_endpoints: Vec::new(),
        }
    }

    /// Register an endpoint in addition to the application's own.
    pub fn with_endpoint(mut self, binding: EndpointBinding) -> Self {
        self.extra_endpoints.push(binding);
        self
    }

    /// Build every component. Must run inside a Tokio runtime because the
    /// metrics engine starts its tasks here.
    pub async fn resolve(self) -> Result<ServerConfigSnapshot, AssemblyError> {
        let config = self.config;
        validate_config(&config).map_err(AssemblyError::Config)?;

        let reporters = ReporterFactory::build(&config.app, &config.metrics)?;
        let metrics = if reporters.is_empty() {
            Capability::Disabled
        } else {
            let collector = MetricsCollector::new()?;
            let engine = MetricsEngine::start(
                &collector,
                &reporters,
                Duration::from_secs(config.metrics.report_interval_secs),
                config.metrics.report_process_metrics,
            )
            .await?;
            let listener = MetricsListener::new(collector.clone());
            Capability::Enabled(MetricsComponents {
                collector,
                engine,
                listener,
            })
        };

        let downstream = DownstreamClient::new(&config.downstream)?;

        let mut routes = RouteTable::new();
        for binding in app_endpoints(&config, &downstream)?
            .into_iter()
            .chain(self.extra_endpoints)
        {
            let id = routes.register(binding.matcher, binding.handler)?;
            tracing::debug!(route = ?id, "Registered route");
        }

        let catalog = ApiErrorCatalog::new();
        for route in routes.routes() {
            for constraint in route.handler.constraints() {
                if !catalog.contains(constraint.error) {
                    return Err(AssemblyError::UnknownErrorName {
                        endpoint: route.handler.name(),
                        field: constraint.field,
                        name: constraint.error,
                    });
                }
            }
        }

        let security = if config.security.enabled {
            let protected = resolve_protected_routes(&config.security.protection, &routes)
                .map_err(AssemblyError::UnknownProtectedEndpoint)?;
            let validator = BasicAuthValidator::new(
                &config.example_basic_auth.username,
                &config.example_basic_auth.password,
            );
            Capability::Enabled(SecurityGate::new(Arc::new(validator), protected))
        } else {
            Capability::Disabled
        };

        let registry_hooks = if config.registry.disabled {
            Capability::Disabled
        } else {
            Capability::Enabled(ServiceRegistryHooks::from_config(&config)?)
        };

        metrics.if_enabled(|m| m.listener.init_server_config_metrics(&config, routes.len()));

        let components = ComponentRegistry {
            metrics,
            registry_hooks,
            security,
        };
        for (name, enabled) in components.summary() {
            tracing::info!(component = name, enabled, "Component resolved");
        }
        tracing::info!(routes = routes.len(), "Server configuration assembled");

        Ok(ServerConfigSnapshot {
            offload: OffloadExecutor::new(config.server.max_offload_tasks),
            app: config.app,
            endpoints: config.endpoints,
            server: config.server,
            debug: config.debug,
            routes: Arc::new(routes),
            components,
            error_mapper: ErrorMapper::new(Arc::new(catalog)),
            downstream,
        })
    }
}
