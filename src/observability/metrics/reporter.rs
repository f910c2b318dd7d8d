//! Reporter selection and the Graphite plaintext encoding.

use std::net::SocketAddr;

use crate::config::{AppInfoConfig, MetricsConfig};
use crate::observability::metrics::MetricsError;

/// One way of publishing metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reporter {
    /// Periodic log line with the full exposition text.
    Log,
    /// Scrape endpoint serving `/metrics`.
    Prometheus { address: SocketAddr },
    /// Periodic push over the Graphite plaintext protocol.
    Graphite { host: String, port: u16, prefix: String },
}

impl Reporter {
    pub fn kind(&self) -> &'static str {
        match self {
            Reporter::Log => "log",
            Reporter::Prometheus { .. } => "prometheus",
            Reporter::Graphite { .. } => "graphite",
        }
    }
}

/// Builds the reporter list from configuration.
pub struct ReporterFactory;

impl ReporterFactory {
    /// An empty list means metrics are off.
    pub fn build(app: &AppInfoConfig, config: &MetricsConfig) -> Result<Vec<Reporter>, MetricsError> {
        let mut reporters = Vec::new();

        if config.log_reporting_enabled {
            reporters.push(Reporter::Log);
        }

        if config.prometheus_reporting_enabled {
            let address = config
                .prometheus_address
                .parse()
                .map_err(|source| MetricsError::InvalidAddress {
                    address: config.prometheus_address.clone(),
                    source,
                })?;
            reporters.push(Reporter::Prometheus { address });
        }

        if config.graphite_reporting_enabled {
            let host = config.graphite_url.trim();
            if host.is_empty() {
                return Err(MetricsError::MissingGraphiteUrl);
            }
            reporters.push(Reporter::Graphite {
                host: host.to_string(),
                port: config.graphite_port,
                prefix: graphite_prefix(app),
            });
        }

        Ok(reporters)
    }
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// `app_id.data_center.environment.instance_id`, each part made path-safe.
pub fn graphite_prefix(app: &AppInfoConfig) -> String {
    [&app.app_id, &app.data_center, &app.environment, &app.instance_id]
        .iter()
        .map(|part| sanitize(part))
        .collect::<Vec<_>>()
        .join(".")
}

fn label_values(labels: &str) -> Vec<&str> {
    let mut values = Vec::new();
    let mut rest = labels;
    while let Some(start) = rest.find("=\"") {
        let after = &rest[start + 2..];
        let mut escaped = false;
        let mut end = None;
        for (i, c) in after.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '"' => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let Some(end) = end else { break };
        values.push(&after[..end]);
        rest = &after[end + 1..];
    }
    values
}

/// Convert Prometheus exposition text to Graphite plaintext lines.
///
/// Label values become extra path components in label order. Comment and
/// blank lines are skipped, as are samples whose value does not parse.
pub fn to_graphite_lines(exposition: &str, prefix: &str, timestamp: u64) -> Vec<String> {
    exposition
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let value: f64 = value.parse().ok()?;
            if !value.is_finite() {
                return None;
            }

            let (name, labels) = match series.split_once('{') {
                Some((name, labels)) => (name, labels.trim_end_matches('}')),
                None => (series, ""),
            };

            let mut path = format!("{}.{}", prefix, sanitize(name));
            for label in label_values(labels) {
                path.push('.');
                path.push_str(&sanitize(label));
            }
            Some(format!("{} {} {}", path, value, timestamp))
        })
        .collect()
}
