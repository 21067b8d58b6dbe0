//! Metrics for the ingestion pipeline and the analysis views
//!
//! Each phase defines its metrics in its own submodule. The Prometheus
//! recorder is installed once; the HTTP surface renders it on `/metrics`.

pub mod analysis;
pub mod ingest;

pub use analysis::AnalysisMetrics;
pub use ingest::IngestMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder and register every phase's metrics.
///
/// Idempotent. Without a call to this the `metrics` macros are no-ops,
/// which is what the CLI and the tests run with.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                register_all_metrics();
                info!("Prometheus recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        })
        .as_ref()
}

/// Render the current snapshot in Prometheus text format
pub fn render() -> Option<String> {
    HANDLE.get()?.as_ref().map(|h| h.render())
}

/// Phase-specific metric collections
pub trait PhaseMetrics {
    /// Touch every metric so it shows up before first use
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Metric names follow `sensor_{phase}_{name}` (counters get `_total`)
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("sensor_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("sensor_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

fn register_all_metrics() {
    register_phase::<IngestMetrics>();
    register_phase::<AnalysisMetrics>();
}

fn register_phase<T: PhaseMetrics>() {
    T::register_metrics();
    let docs = T::metrics_documentation();
    for doc in &docs {
        match doc.metric_type {
            MetricType::Counter => ::metrics::describe_counter!(doc.name, doc.help),
            MetricType::Histogram => ::metrics::describe_histogram!(doc.name, doc.help),
        }
    }
    info!("Registered {} metrics for phase '{}'", docs.len(), T::phase_name());
}
