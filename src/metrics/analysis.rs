//! Analysis view metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct AnalysisMetrics;

impl AnalysisMetrics {
    pub fn record_view_rendered(view: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "analysis", "views_rendered"), "view" => view)
            .increment(1);
    }

    /// A label filter came back empty and the view was skipped
    pub fn record_view_skipped(view: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "analysis", "views_skipped"), "view" => view)
            .increment(1);
    }
}

impl PhaseMetrics for AnalysisMetrics {
    fn register_metrics() {
        let _ = ::metrics::counter!(phase_metric!(counter, "analysis", "views_rendered"));
        let _ = ::metrics::counter!(phase_metric!(counter, "analysis", "views_skipped"));
    }

    fn phase_name() -> &'static str {
        "analysis"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "analysis", "views_rendered"),
                metric_type: MetricType::Counter,
                help: "Analysis views rendered",
            },
            MetricDoc {
                name: phase_metric!(counter, "analysis", "views_skipped"),
                metric_type: MetricType::Counter,
                help: "Analysis views skipped because their label filter was empty",
            },
        ]
    }
}
