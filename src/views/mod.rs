//! Analysis views that consume a normalized `ReadingTable`.
//!
//! The pipeline does all coercion and filtering; a view only reads the
//! table it is handed and describes it.

pub mod incident;
pub mod overview;

pub use incident::{IncidentReport, IncidentView, MagnitudeStats};
pub use overview::{OverviewReport, OverviewView};

use crate::metrics::AnalysisMetrics;
use crate::types::ReadingTable;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which analysis the caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSelector {
    Overview,
    Bump,
    Pothole,
}

impl AnalysisSelector {
    pub const ALL: [AnalysisSelector; 3] = [
        AnalysisSelector::Overview,
        AnalysisSelector::Bump,
        AnalysisSelector::Pothole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisSelector::Overview => "overview",
            AnalysisSelector::Bump => "bump",
            AnalysisSelector::Pothole => "pothole",
        }
    }

    /// Menu title shown above the rendered view
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisSelector::Overview => "OverView",
            AnalysisSelector::Bump => "Bump Analysis",
            AnalysisSelector::Pothole => "Pothole Analysis",
        }
    }
}

impl Default for AnalysisSelector {
    fn default() -> Self {
        AnalysisSelector::Overview
    }
}

impl fmt::Display for AnalysisSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisSelector {
    type Err = String;

    /// Accepts the short names and the menu titles, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AnalysisSelector::ALL
            .into_iter()
            .find(|sel| {
                wanted.eq_ignore_ascii_case(sel.as_str()) || wanted.eq_ignore_ascii_case(sel.title())
            })
            .ok_or_else(|| {
                format!("unknown view '{wanted}', expected one of: overview, bump, pothole")
            })
    }
}

/// A rendering collaborator for one menu entry
pub trait AnalysisView: Send + Sync {
    fn selector(&self) -> AnalysisSelector;

    fn render(&self, table: &ReadingTable) -> ViewReport;
}

pub fn view_for(selector: AnalysisSelector) -> Box<dyn AnalysisView> {
    match selector {
        AnalysisSelector::Overview => Box::new(OverviewView),
        AnalysisSelector::Bump => Box::new(IncidentView::bump()),
        AnalysisSelector::Pothole => Box::new(IncidentView::pothole()),
    }
}

/// Render `selector` over `table`, recording the outcome
pub fn render_view(selector: AnalysisSelector, table: &ReadingTable) -> ViewReport {
    let report = view_for(selector).render(table);
    match report.outcome {
        ViewOutcome::Skipped { .. } => AnalysisMetrics::record_view_skipped(selector.as_str()),
        _ => AnalysisMetrics::record_view_rendered(selector.as_str()),
    }
    report
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewReport {
    pub view: AnalysisSelector,
    pub title: &'static str,
    #[serde(flatten)]
    pub outcome: ViewOutcome,
}

impl ViewReport {
    pub fn new(view: AnalysisSelector, outcome: ViewOutcome) -> Self {
        Self { view, title: view.title(), outcome }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, ViewOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewOutcome {
    Overview(OverviewReport),
    Incident(IncidentReport),
    /// The label filter was empty; nothing was analysed
    Skipped { notice: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    pub fn of(table: &ReadingTable) -> Option<Self> {
        table.time_span().map(|(start, end)| Self { start, end })
    }

    pub fn seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} ({:.1}s)",
            self.start.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.end.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.seconds()
        )
    }
}

impl fmt::Display for ViewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        match &self.outcome {
            ViewOutcome::Overview(report) => write!(f, "{report}"),
            ViewOutcome::Incident(report) => write!(f, "{report}"),
            ViewOutcome::Skipped { notice } => writeln!(f, "⚠️  {notice}"),
        }
    }
}
