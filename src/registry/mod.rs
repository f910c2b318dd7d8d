//! Service-registry integration.
//!
//! # Data Flow
//! ```text
//! server bound  → ServerLifecycleHook::on_startup  → POST   {url}/apps/{app_id}
//! server drained → ServerLifecycleHook::on_shutdown → DELETE {url}/apps/{app_id}/{instance_id}
//! ```
//!
//! # Design Decisions
//! - Registry failures are logged, never fatal: the service keeps serving
//! - When integration is disabled the hooks are a `Capability::Disabled`
//!   and do nothing

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::components::Capability;
use crate::config::AppConfig;

/// Hooks run around the server's lifetime.
#[async_trait]
pub trait ServerLifecycleHook: Send + Sync {
    /// Called once the listener is bound.
    async fn on_startup(&self, bound: SocketAddr);

    /// Called after the server stopped accepting and drained.
    async fn on_shutdown(&self);
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry url is not set")]
    MissingUrl,

    #[error("invalid registry url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("failed to build registry client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Body of the registration call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Registration {
    pub app_id: String,
    pub instance_id: String,
    pub port: u16,
    pub use_ssl: bool,
    pub datacenter_type: String,
    pub data_center: String,
    pub environment: String,
    pub status: &'static str,
}

/// Registers the instance on startup and deregisters it on shutdown.
#[derive(Debug, Clone)]
pub struct ServiceRegistryHooks {
    base: Url,
    app_id: String,
    instance_id: String,
    use_ssl: bool,
    datacenter_type: String,
    data_center: String,
    environment: String,
    client: reqwest::Client,
}

impl ServiceRegistryHooks {
    pub fn from_config(config: &AppConfig) -> Result<Self, RegistryError> {
        let raw = config.registry.url.as_deref().ok_or(RegistryError::MissingUrl)?;
        let base = Url::parse(raw).map_err(|source| RegistryError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()?;

        Ok(Self {
            base,
            app_id: config.app.app_id.clone(),
            instance_id: config.app.instance_id.clone(),
            use_ssl: config.endpoints.use_ssl,
            datacenter_type: config.registry.datacenter_type.clone(),
            data_center: config.app.data_center.clone(),
            environment: config.app.environment.clone(),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.base.as_str().trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }
        url
    }

    pub fn registration(&self, port: u16) -> Registration {
        Registration {
            app_id: self.app_id.clone(),
            instance_id: self.instance_id.clone(),
            port,
            use_ssl: self.use_ssl,
            datacenter_type: self.datacenter_type.clone(),
            data_center: self.data_center.clone(),
            environment: self.environment.clone(),
            status: "UP",
        }
    }
}

#[async_trait]
impl ServerLifecycleHook for ServiceRegistryHooks {
    async fn on_startup(&self, bound: SocketAddr) {
        let url = self.endpoint(&["apps", &self.app_id]);
        let result = self
            .client
            .post(&url)
            .json(&self.registration(bound.port()))
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match result {
            Ok(_) => tracing::info!(url = %url, instance_id = %self.instance_id, "Registered with service registry"),
            Err(e) => tracing::warn!(url = %url, error = %e, "Service registration failed"),
        }
    }

    async fn on_shutdown(&self) {
        let url = self.endpoint(&["apps", &self.app_id, &self.instance_id]);
        let result = self
            .client
            .delete(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match result {
            Ok(_) => tracing::info!(url = %url, "Deregistered from service registry"),
            Err(e) => tracing::warn!(url = %url, error = %e, "Service deregistration failed"),
        }
    }
}

#[async_trait]
impl<H: ServerLifecycleHook> ServerLifecycleHook for Capability<H> {
    async fn on_startup(&self, bound: SocketAddr) {
        if let Capability::Enabled(hook) = self {
            hook.on_startup(bound).await;
        }
    }

    async fn on_shutdown(&self) {
        if let Capability::Enabled(hook) = self {
            hook.on_shutdown().await;
        }
    }
}
