//! Metrics collection and reporting.
//!
//! # Responsibilities
//! - Own the recorder that every metric of one assembled server goes to
//! - Record per-request counters and latencies ([`MetricsListener`])
//! - Publish server configuration as gauges at startup
//! - Drive the configured reporters ([`MetricsEngine`])
//!
//! # Metrics
//! - `requests_total` (counter): by endpoint, method, status
//! - `request_duration_seconds` (histogram): latency by endpoint
//! - `requests_in_flight` (gauge): requests currently being handled
//! - `requests_cancelled_total` (counter): requests dropped before a response
//! - `request_errors_total` (counter): 4xx/5xx by endpoint and class
//! - `server_*` (gauges): thread counts, limits, route count
//! - `process_*` (gauges): memory use, when process metrics are enabled
//!
//! # Design Decisions
//! - The recorder is local to the collector; macros are routed to it with
//!   `metrics::with_local_recorder`
//! - Histogram buckets tuned for typical web latencies

pub mod engine;
pub mod reporter;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::components::Capability;
use crate::config::AppConfig;

pub use engine::MetricsEngine;
pub use reporter::{graphite_prefix, to_graphite_lines, Reporter, ReporterFactory};

pub mod names {
    pub const REQUESTS_TOTAL: &str = "requests_total";
    pub const REQUEST_DURATION: &str = "request_duration_seconds";
    pub const REQUESTS_IN_FLIGHT: &str = "requests_in_flight";
    pub const REQUEST_ERRORS: &str = "request_errors_total";
    pub const REQUESTS_CANCELLED: &str = "requests_cancelled_total";
    pub const SERVER_BOSS_THREADS: &str = "server_boss_threads";
    pub const SERVER_WORKER_THREADS: &str = "server_worker_threads";
    pub const SERVER_MAX_REQUEST_SIZE: &str = "server_max_request_size_bytes";
    pub const SERVER_REQUEST_TIMEOUT: &str = "server_request_timeout_seconds";
    pub const SERVER_ROUTES: &str = "server_routes";
    pub const SERVER_SSL_ENABLED: &str = "server_ssl_enabled";
    pub const PROCESS_PHYSICAL_MEMORY: &str = "process_physical_memory_bytes";
    pub const PROCESS_VIRTUAL_MEMORY: &str = "process_virtual_memory_bytes";
}

const LATENCY_BUCKETS: [f64; 11] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 10.0,
];

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("invalid prometheus_address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("graphite reporting is enabled but graphite_url is empty")]
    MissingGraphiteUrl,

    #[error("failed to bind metrics endpoint on {address}: {source}")]
    Bind {
        address: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to build metrics recorder: {0}")]
    Build(#[from] metrics_exporter_prometheus::BuildError),
}

/// The recorder for one assembled server. Cheap to clone.
#[derive(Clone)]
pub struct MetricsCollector {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector").finish_non_exhaustive()
    }
}

impl MetricsCollector {
    pub fn new() -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(names::REQUEST_DURATION.to_string()), &LATENCY_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();
        Ok(Self {
            recorder: Arc::new(recorder),
            handle,
        })
    }

    /// Run `f` with this collector as the active recorder.
    pub fn record<R>(&self, f: impl FnOnce() -> R) -> R {
        metrics::with_local_recorder(self.recorder.as_ref(), f)
    }

    /// Current state in Prometheus exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }
}

/// Records request and server metrics into a collector.
#[derive(Debug, Clone)]
pub struct MetricsListener {
    collector: MetricsCollector,
}

impl MetricsListener {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    /// Count a request as in flight until the returned guard is dropped.
    pub fn request_started(&self) -> InFlightGuard {
        self.collector
            .record(|| metrics::gauge!(names::REQUESTS_IN_FLIGHT).increment(1.0));
        InFlightGuard {
            collector: self.collector.clone(),
            finished: false,
        }
    }

    pub fn request_finished(&self, endpoint: &str, method: &Method, status: StatusCode, elapsed: Duration) {
        self.collector.record(|| {
            metrics::counter!(
                names::REQUESTS_TOTAL,
                "endpoint" => endpoint.to_string(),
                "method" => method.to_string(),
                "status" => status.as_u16().to_string()
            )
            .increment(1);
            metrics::histogram!(names::REQUEST_DURATION, "endpoint" => endpoint.to_string())
                .record(elapsed.as_secs_f64());

            let class = if status.is_server_error() {
                Some("5xx")
            } else if status.is_client_error() {
                Some("4xx")
            } else {
                None
            };
            if let Some(class) = class {
                metrics::counter!(
                    names::REQUEST_ERRORS,
                    "endpoint" => endpoint.to_string(),
                    "class" => class
                )
                .increment(1);
            }
        });
    }

    /// Publish the effective server configuration as gauges.
    pub fn init_server_config_metrics(&self, config: &AppConfig, route_count: usize) {
        let workers = if config.server.worker_thread_count == 0 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            config.server.worker_thread_count
        };
        self.collector.record(|| {
            metrics::gauge!(names::SERVER_BOSS_THREADS).set(config.server.boss_thread_count as f64);
            metrics::gauge!(names::SERVER_WORKER_THREADS).set(workers as f64);
            metrics::gauge!(names::SERVER_MAX_REQUEST_SIZE).set(config.server.max_request_size_bytes as f64);
            metrics::gauge!(names::SERVER_REQUEST_TIMEOUT).set(config.server.request_timeout_secs as f64);
            metrics::gauge!(names::SERVER_ROUTES).set(route_count as f64);
            metrics::gauge!(names::SERVER_SSL_ENABLED).set(if config.endpoints.use_ssl { 1.0 } else { 0.0 });
        });
    }
}

/// One request counted in `requests_in_flight`.
///
/// Dropping the guard without [`InFlightGuard::finish`] means the request
/// future was abandoned, usually because the client went away.
#[derive(Debug)]
#[must_use = "the request stops counting as in flight when the guard is dropped"]
pub struct InFlightGuard {
    collector: MetricsCollector,
    finished: bool,
}

impl InFlightGuard {
    /// Mark the request as answered.
    pub fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let finished = self.finished;
        self.collector.record(|| {
            metrics::gauge!(names::REQUESTS_IN_FLIGHT).decrement(1.0);
            if !finished {
                metrics::counter!(names::REQUESTS_CANCELLED).increment(1);
            }
        });
    }
}

/// Everything the metrics capability needs at runtime.
#[derive(Debug)]
pub struct MetricsComponents {
    pub collector: MetricsCollector,
    pub engine: MetricsEngine,
    pub listener: MetricsListener,
}

impl MetricsComponents {
    pub fn shutdown(&self) {
        self.engine.stop();
    }
}

impl Capability<MetricsComponents> {
    pub fn request_started(&self) -> Option<InFlightGuard> {
        match self {
            Capability::Enabled(metrics) => Some(metrics.listener.request_started()),
            Capability::Disabled => None,
        }
    }

    pub fn request_finished(&self, endpoint: &str, method: &Method, status: StatusCode, elapsed: Duration) {
        if let Capability::Enabled(metrics) = self {
            metrics.listener.request_finished(endpoint, method, status, elapsed);
        }
    }
}
