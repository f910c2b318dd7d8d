//! Background tasks that keep metrics fresh and publish them.
//!
//! # Data Flow
//! ```text
//! upkeep tick ──▶ process gauges + histogram upkeep
//! report tick ──▶ Log reporter      ──▶ tracing::info!
//!             └─▶ Graphite reporter ──▶ TCP push (plaintext)
//! scrape      ──▶ Prometheus reporter (GET /metrics)
//! ```

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::observability::metrics::reporter::{to_graphite_lines, Reporter};
use crate::observability::metrics::{names, MetricsCollector, MetricsError};

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Running reporter tasks. Stopped on [`MetricsEngine::stop`] or drop.
#[derive(Debug)]
pub struct MetricsEngine {
    tasks: Vec<JoinHandle<()>>,
    prometheus_address: Option<SocketAddr>,
}

impl MetricsEngine {
    /// Start upkeep and every reporter.
    ///
    /// Must be called inside a Tokio runtime. The Prometheus listener is
    /// bound before this returns, so a bind failure fails startup.
    pub async fn start(
        collector: &MetricsCollector,
        reporters: &[Reporter],
        interval: Duration,
        process_metrics: bool,
    ) -> Result<Self, MetricsError> {
        let mut tasks = Vec::new();
        let mut prometheus_address = None;

        tasks.push(tokio::spawn(upkeep_loop(collector.clone(), process_metrics)));

        for reporter in reporters {
            match reporter {
                Reporter::Log => {
                    tasks.push(tokio::spawn(log_loop(collector.clone(), interval)));
                }
                Reporter::Prometheus { address } => {
                    let listener = TcpListener::bind(address)
                        .await
                        .map_err(|source| MetricsError::Bind {
                            address: *address,
                            source,
                        })?;
                    let bound = listener.local_addr().map_err(|source| MetricsError::Bind {
                        address: *address,
                        source,
                    })?;
                    tracing::info!(address = %bound, "Prometheus metrics endpoint listening");
                    prometheus_address = Some(bound);
                    tasks.push(tokio::spawn(serve_scrape(listener, collector.handle().clone())));
                }
                Reporter::Graphite { host, port, prefix } => {
                    tasks.push(tokio::spawn(graphite_loop(
                        collector.clone(),
                        format!("{}:{}", host, port),
                        prefix.clone(),
                        interval,
                    )));
                }
            }
            tracing::debug!(reporter = reporter.kind(), "Metrics reporter started");
        }

        Ok(Self {
            tasks,
            prometheus_address,
        })
    }

    /// Address the scrape endpoint actually bound to.
    pub fn prometheus_address(&self) -> Option<SocketAddr> {
        self.prometheus_address
    }

    pub fn stop(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for MetricsEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn report_ticker(interval: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker
}

async fn upkeep_loop(collector: MetricsCollector, process_metrics: bool) {
    let mut ticker = tokio::time::interval(UPKEEP_INTERVAL);
    loop {
        ticker.tick().await;
        if process_metrics {
            record_process_metrics(&collector);
        }
        collector.handle().run_upkeep();
    }
}

fn record_process_metrics(collector: &MetricsCollector) {
    if let Some(usage) = memory_stats::memory_stats() {
        collector.record(|| {
            metrics::gauge!(names::PROCESS_PHYSICAL_MEMORY).set(usage.physical_mem as f64);
            metrics::gauge!(names::PROCESS_VIRTUAL_MEMORY).set(usage.virtual_mem as f64);
        });
    }
}

async fn log_loop(collector: MetricsCollector, interval: Duration) {
    let mut ticker = report_ticker(interval);
    loop {
        ticker.tick().await;
        tracing::info!(target: "metrics", report = %collector.render(), "Metrics report");
    }
}

async fn scrape(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

async fn serve_scrape(listener: TcpListener, handle: PrometheusHandle) {
    let app = Router::new().route("/metrics", get(scrape)).with_state(handle);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Prometheus metrics endpoint stopped");
    }
}

async fn graphite_loop(collector: MetricsCollector, address: String, prefix: String, interval: Duration) {
    let mut ticker = report_ticker(interval);
    loop {
        ticker.tick().await;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let lines = to_graphite_lines(&collector.render(), &prefix, timestamp);
        if lines.is_empty() {
            continue;
        }
        if let Err(e) = push_graphite(&address, &lines).await {
            tracing::warn!(address = %address, error = %e, "Graphite push failed");
        }
    }
}

async fn push_graphite(address: &str, lines: &[String]) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(address).await?;
    let mut payload = lines.join("\n");
    payload.push('\n');
    stream.write_all(payload.as_bytes()).await?;
    stream.shutdown().await
}
