//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required identity and credentials are present
//! - Validate value ranges (timeouts > 0, ports valid and distinct)
//! - Reporter and registry settings are complete when switched on
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{AppConfig, ProtectionConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn require_non_empty(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "must be set"));
    }
}

/// Check the configuration for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    require_non_empty(&mut errors, "app.app_id", &config.app.app_id);
    require_non_empty(&mut errors, "app.environment", &config.app.environment);
    require_non_empty(&mut errors, "app.data_center", &config.app.data_center);
    require_non_empty(&mut errors, "app.instance_id", &config.app.instance_id);

    let endpoints = &config.endpoints;
    if endpoints.port == 0 {
        errors.push(ValidationError::new("endpoints.port", "must be non-zero"));
    }
    if endpoints.use_ssl {
        if endpoints.ssl_port == 0 {
            errors.push(ValidationError::new("endpoints.ssl_port", "must be non-zero"));
        }
        if endpoints.ssl_port == endpoints.port {
            errors.push(ValidationError::new(
                "endpoints.ssl_port",
                "must differ from endpoints.port",
            ));
        }
        match &endpoints.tls {
            Some(tls) => {
                require_non_empty(&mut errors, "endpoints.tls.cert_path", &tls.cert_path);
                require_non_empty(&mut errors, "endpoints.tls.key_path", &tls.key_path);
            }
            None => errors.push(ValidationError::new(
                "endpoints.tls",
                "required when endpoints.use_ssl is true",
            )),
        }
    }

    let server = &config.server;
    if server.boss_thread_count == 0 {
        errors.push(ValidationError::new("server.boss_thread_count", "must be at least 1"));
    }
    if server.max_request_size_bytes == 0 {
        errors.push(ValidationError::new("server.max_request_size_bytes", "must be positive"));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be positive"));
    }
    if server.max_offload_tasks == 0 {
        errors.push(ValidationError::new("server.max_offload_tasks", "must be at least 1"));
    }

    let metrics = &config.metrics;
    if metrics.any_reporter_enabled() && metrics.report_interval_secs == 0 {
        errors.push(ValidationError::new("metrics.report_interval_secs", "must be positive"));
    }
    if metrics.prometheus_reporting_enabled
        && metrics.prometheus_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "metrics.prometheus_address",
            format!("'{}' is not a socket address", metrics.prometheus_address),
        ));
    }
    if metrics.graphite_reporting_enabled {
        require_non_empty(&mut errors, "metrics.graphite_url", &metrics.graphite_url);
        if metrics.graphite_port == 0 {
            errors.push(ValidationError::new("metrics.graphite_port", "must be non-zero"));
        }
    }

    if !config.registry.disabled {
        match config.registry.url.as_deref() {
            Some(url) if url::Url::parse(url).is_ok() => {}
            Some(url) => errors.push(ValidationError::new(
                "registry.url",
                format!("'{}' is not a valid URL", url),
            )),
            None => errors.push(ValidationError::new(
                "registry.url",
                "required when registry.disabled is false",
            )),
        }
        require_non_empty(&mut errors, "registry.datacenter_type", &config.registry.datacenter_type);
    }

    if let ProtectionConfig::Endpoints { names } = &config.security.protection {
        if config.security.enabled && names.is_empty() {
            errors.push(ValidationError::new(
                "security.protection.names",
                "at least one endpoint must be listed",
            ));
        }
    }

    require_non_empty(&mut errors, "example_basic_auth.username", &config.example_basic_auth.username);
    require_non_empty(&mut errors, "example_basic_auth.password", &config.example_basic_auth.password);
    if config.example_basic_auth.username.contains(':') {
        errors.push(ValidationError::new(
            "example_basic_auth.username",
            "must not contain ':'",
        ));
    }

    if config.downstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("downstream.connect_timeout_secs", "must be positive"));
    }
    if config.downstream.request_timeout_secs == 0 {
        errors.push(ValidationError::new("downstream.request_timeout_secs", "must be positive"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
