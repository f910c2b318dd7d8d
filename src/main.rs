//! Microservice template binary.
//!
//! ```text
//!   client ──▶ listener (HTTP or HTTPS)
//!                 │
//!                 ▼
//!           ┌───────────┐    ┌──────────────┐    ┌──────────────────┐
//!           │ dispatch  │──▶ │ route table  │──▶ │  security gate   │
//!           └───────────┘    └──────────────┘    └────────┬─────────┘
//!                 ▲                                       ▼
//!                 │                      ┌────────────────────────────────┐
//!           ┌───────────┐                │ standard endpoint │ proxy      │
//!           │ error     │ ◀──failure──── │ (validated input) │ (streamed) │
//!           │ mapper    │                └────────────────────────────────┘
//!           └───────────┘                               │
//!                                                       ▼
//!                                               downstream client
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use microservice_template::config::load_config;
use microservice_template::lifecycle::{launch, shutdown_signal, Shutdown};
use microservice_template::observability::logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "microservice-template", version, about = "Example HTTP microservice")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration from {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("A rustls crypto provider was already installed");
    }

    let workers = config.server.boss_thread_count
        + match config.server.worker_thread_count {
            0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        };
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        app_id = %config.app.app_id,
        environment = %config.app.environment,
        worker_threads = workers,
        "microservice-template starting"
    );

    let result = runtime.block_on(async move {
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            trigger.trigger();
        });
        launch(config, &shutdown).await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Service failed");
            ExitCode::FAILURE
        }
    }
}
