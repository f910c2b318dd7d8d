//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, path from --config)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → AppConfig (validated, immutable)
//!     → consumed once by components::assembly
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All sections have defaults to allow minimal configs
//! - Missing or malformed config aborts startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, AppInfoConfig, BasicAuthCredentials, DebugConfig, DownstreamConfig,
    EndpointsConfig, LogFormat, LoggingConfig, MetricsConfig, ProtectionConfig, RegistryConfig,
    SecurityConfig, ServerConfig, TlsConfig,
};
