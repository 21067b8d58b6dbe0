//! Ingestion phase metrics
//!
//! Fetch outcomes, envelope rejections and per-cell coercion counts.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct IngestMetrics;

impl IngestMetrics {
    /// Record a fetch that produced a normalized table
    pub fn record_fetch_success(duration_secs: f64, rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "ingest", "fetch_success")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "ingest", "fetch_duration_seconds"))
            .record(duration_secs);
        ::metrics::counter!(phase_metric!(counter, "ingest", "readings")).increment(rows as u64);
    }

    /// Record a failed fetch cycle, labelled by error kind
    pub fn record_fetch_error(kind: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "ingest", "fetch_error"), "kind" => kind)
            .increment(1);
    }

    /// Record cells coerced to the missing-marker
    pub fn record_coerced_missing(timestamps: usize, numbers: usize) {
        if timestamps > 0 {
            ::metrics::counter!(phase_metric!(counter, "ingest", "coerced_missing"), "column" => "timestamp")
                .increment(timestamps as u64);
        }
        if numbers > 0 {
            ::metrics::counter!(phase_metric!(counter, "ingest", "coerced_missing"), "column" => "axis")
                .increment(numbers as u64);
        }
    }
}

impl PhaseMetrics for IngestMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "ingest", "fetch_success"));
        let _ = counter!(phase_metric!(counter, "ingest", "fetch_error"));
        let _ = counter!(phase_metric!(counter, "ingest", "readings"));
        let _ = counter!(phase_metric!(counter, "ingest", "coerced_missing"));
        let _ = histogram!(phase_metric!(histogram, "ingest", "fetch_duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "ingest"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "ingest", "fetch_success"),
                metric_type: MetricType::Counter,
                help: "Fetch cycles that produced a normalized table",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "fetch_error"),
                metric_type: MetricType::Counter,
                help: "Fetch cycles that ended in an error, by kind",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "readings"),
                metric_type: MetricType::Counter,
                help: "Readings ingested",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "coerced_missing"),
                metric_type: MetricType::Counter,
                help: "Cells coerced to the missing-marker",
            },
            MetricDoc {
                name: phase_metric!(histogram, "ingest", "fetch_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of a full fetch cycle",
            },
        ]
    }
}
