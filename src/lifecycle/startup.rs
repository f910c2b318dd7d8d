//! Startup orchestration.
//!
//! # Responsibilities
//! - Assemble the server configuration snapshot
//! - Bind the plaintext or TLS listener
//! - Run lifecycle hooks around the server's lifetime
//!
//! # Design Decisions
//! - Fail fast: any assembly or bind error is fatal
//! - Hooks run after bind (startup) and after drain (shutdown)
//! - Background metrics tasks are stopped last

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use axum_server::Handle;
use tokio::net::TcpListener;

use crate::components::{ComponentAssembly, ServerConfigSnapshot};
use crate::config::AppConfig;
use crate::http::{load_tls_config, HttpServer};
use crate::lifecycle::Shutdown;
use crate::registry::ServerLifecycleHook;

/// Assemble and serve until `shutdown` fires.
pub async fn launch(config: AppConfig, shutdown: &Shutdown) -> anyhow::Result<()> {
    let snapshot = Arc::new(
        ComponentAssembly::new(config)
            .resolve()
            .await
            .context("failed to assemble server components")?,
    );

    let served = serve(snapshot.clone(), shutdown).await;

    snapshot.components.registry_hooks.on_shutdown().await;
    snapshot.components.shutdown();
    tracing::info!("Shutdown complete");
    served
}

async fn serve(snapshot: Arc<ServerConfigSnapshot>, shutdown: &Shutdown) -> anyhow::Result<()> {
    let endpoints = snapshot.endpoints.clone();
    let server = HttpServer::new(snapshot.clone());

    if endpoints.use_ssl {
        let tls = endpoints
            .tls
            .as_ref()
            .context("endpoints.tls is required when use_ssl is set")?;
        let rustls = load_tls_config(tls)
            .await
            .with_context(|| format!("failed to load TLS material from {}", tls.cert_path))?;

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, endpoints.ssl_port));
        let handle = Handle::new();
        let running = tokio::spawn(server.run_tls(addr, rustls, handle.clone(), shutdown.subscribe()));

        match handle.listening().await {
            Some(bound) => snapshot.components.registry_hooks.on_startup(bound).await,
            None => tracing::warn!(address = %addr, "TLS listener stopped before binding"),
        }
        running
            .await
            .context("TLS server task failed")?
            .with_context(|| format!("TLS server on {} failed", addr))
    } else {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, endpoints.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        let bound = listener.local_addr()?;
        tracing::info!(address = %bound, "Listening for connections");

        snapshot.components.registry_hooks.on_startup(bound).await;
        server
            .run(listener, shutdown.subscribe())
            .await
            .with_context(|| format!("HTTP server on {} failed", bound))
    }
}
