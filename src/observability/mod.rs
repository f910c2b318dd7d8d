//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch / endpoints / components produce:
//!     → logging.rs (structured log events, access log)
//!     → metrics/ (counters, gauges, histograms in a per-assembly recorder)
//!
//! Consumers:
//!     → stdout (JSON or text)
//!     → reporters: periodic log, Prometheus scrape, Graphite push
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log line of a request
//! - The metrics recorder is owned by the assembled components, not
//!   installed globally, so several servers can live in one process

pub mod logging;
pub mod metrics;
