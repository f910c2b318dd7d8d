//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.
//! Sections carry defaults so that a minimal file only needs the `[app]`
//! identity and the `[example_basic_auth]` credentials.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Application identity (used for metric prefixes and registration).
    pub app: AppInfoConfig,

    /// Listening ports and TLS.
    pub endpoints: EndpointsConfig,

    /// Runtime sizing and request limits.
    pub server: ServerConfig,

    /// Debug switches.
    pub debug: DebugConfig,

    /// Metrics reporters.
    pub metrics: MetricsConfig,

    /// Service registry integration.
    pub registry: RegistryConfig,

    /// Request security gate.
    pub security: SecurityConfig,

    /// Credentials for the basic-auth example endpoints.
    pub example_basic_auth: BasicAuthCredentials,

    /// Outbound HTTP client settings.
    pub downstream: DownstreamConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

/// Application identity.
///
/// `app_id` and `environment` have no usable default; validation rejects
/// a config that leaves them empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppInfoConfig {
    pub app_id: String,
    pub environment: String,
    pub data_center: String,
    pub instance_id: String,
}

impl Default for AppInfoConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            environment: String::new(),
            data_center: "local".to_string(),
            instance_id: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
        }
    }
}

/// Listening ports.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Plaintext HTTP port.
    pub port: u16,

    /// TLS port, used when `use_ssl` is set.
    pub ssl_port: u16,

    /// Serve TLS on `ssl_port` instead of plaintext on `port`.
    pub use_ssl: bool,

    /// Certificate and key, required when `use_ssl` is set.
    pub tls: Option<TlsConfig>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            ssl_port: 8443,
            use_ssl: false,
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Runtime sizing and request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Threads reserved for accepting connections.
    pub boss_thread_count: usize,

    /// Threads running request handlers. `0` means one per CPU core.
    pub worker_thread_count: usize,

    /// Largest request body accepted, in bytes.
    pub max_request_size_bytes: usize,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum number of offloaded blocking tasks running at once.
    pub max_offload_tasks: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            boss_thread_count: 1,
            worker_thread_count: 0,
            max_request_size_bytes: 1024 * 1024,
            request_timeout_secs: 30,
            max_offload_tasks: 64,
        }
    }
}

/// Debug switches.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    /// Log inbound request headers at debug level.
    pub actions_enabled: bool,

    /// Attach the HTTP trace layer (per-request span and lifecycle events).
    pub channel_lifecycle_logging_enabled: bool,
}

/// Metrics reporters. No reporter enabled means no metrics at all.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Periodically log a metrics snapshot.
    pub log_reporting_enabled: bool,

    /// Expose a Prometheus scrape endpoint.
    pub prometheus_reporting_enabled: bool,

    /// Bind address for the scrape endpoint.
    pub prometheus_address: String,

    /// Push metrics to Graphite over the plaintext protocol.
    pub graphite_reporting_enabled: bool,

    /// Graphite host.
    pub graphite_url: String,

    /// Graphite plaintext port.
    pub graphite_port: u16,

    /// Reporting period for push reporters, in seconds.
    pub report_interval_secs: u64,

    /// Record process memory gauges.
    pub report_process_metrics: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            log_reporting_enabled: false,
            prometheus_reporting_enabled: false,
            prometheus_address: "127.0.0.1:9090".to_string(),
            graphite_reporting_enabled: false,
            graphite_url: String::new(),
            graphite_port: 2003,
            report_interval_secs: 60,
            report_process_metrics: false,
        }
    }
}

impl MetricsConfig {
    /// Returns true if at least one reporter is switched on.
    pub fn any_reporter_enabled(&self) -> bool {
        self.log_reporting_enabled
            || self.prometheus_reporting_enabled
            || self.graphite_reporting_enabled
    }
}

/// Service registry integration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Skip registration entirely.
    pub disabled: bool,

    /// Datacenter type reported to the registry.
    pub datacenter_type: String,

    /// Base URL of the registry.
    pub url: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            disabled: true,
            datacenter_type: "MyOwn".to_string(),
            url: None,
        }
    }
}

/// Request security gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bind a security validator at all.
    pub enabled: bool,

    /// Which routes the validator protects.
    pub protection: ProtectionConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            protection: ProtectionConfig::Endpoints {
                names: vec!["example_basic_auth_post".to_string()],
            },
        }
    }
}

/// Protected-route selection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProtectionConfig {
    /// Every route except the exempt ones (health check).
    AllExceptExempt,
    /// Only the named endpoints.
    Endpoints { names: Vec<String> },
}

/// Username and password pair.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Whole-call timeout in seconds (until response headers).
    pub request_timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logging.
    #[default]
    Json,
    /// Human-readable text logging.
    Text,
}

/// Log output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [app]
            app_id = "template"
            environment = "local"

            [example_basic_auth]
            username = "user"
            password = "pass"
            "#,
        )
        .unwrap();

        assert_eq!(config.app.app_id, "template");
        assert_eq!(config.endpoints.port, 8080);
        assert!(!config.endpoints.use_ssl);
        assert!(config.registry.disabled);
        assert!(!config.metrics.any_reporter_enabled());
        assert_eq!(
            config.security.protection,
            ProtectionConfig::Endpoints {
                names: vec!["example_basic_auth_post".to_string()]
            }
        );
    }

    #[test]
    fn test_protection_mode_parsing() {
        let config: AppConfig = toml::from_str(
            r#"
            [security.protection]
            mode = "all_except_exempt"
            "#,
        )
        .unwrap();
        assert_eq!(config.security.protection, ProtectionConfig::AllExceptExempt);
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = BasicAuthCredentials {
            username: "user".into(),
            password: "secret".into(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("secret"));
    }
}
