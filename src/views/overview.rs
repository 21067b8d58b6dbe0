use super::{AnalysisSelector, AnalysisView, TimeSpan, ViewOutcome, ViewReport};
use crate::summary::{describe, label_counts, Summary};
use crate::types::ReadingTable;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct LabelCount {
    pub label: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewReport {
    pub rows: usize,
    pub labels: Vec<LabelCount>,
    pub time_span: Option<TimeSpan>,
    /// Rows whose timestamp could not be parsed
    pub missing_timestamps: usize,
    pub summary: Summary,
}

pub struct OverviewView;

impl AnalysisView for OverviewView {
    fn selector(&self) -> AnalysisSelector {
        AnalysisSelector::Overview
    }

    fn render(&self, table: &ReadingTable) -> ViewReport {
        let labels = label_counts(table)
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect();
        let report = OverviewReport {
            rows: table.len(),
            labels,
            time_span: TimeSpan::of(table),
            missing_timestamps: table.rows.iter().filter(|r| r.timestamp.is_missing()).count(),
            summary: describe(table),
        };
        ViewReport::new(AnalysisSelector::Overview, ViewOutcome::Overview(report))
    }
}

impl fmt::Display for OverviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Readings: {}", self.rows)?;
        match &self.time_span {
            Some(span) => writeln!(f, "Time span: {span}")?,
            None => writeln!(f, "Time span: n/a")?,
        }
        if self.missing_timestamps > 0 {
            writeln!(f, "Unparseable timestamps: {}", self.missing_timestamps)?;
        }
        writeln!(f, "Labels:")?;
        for lc in &self.labels {
            writeln!(f, "  {:<12} {}", lc.label.as_deref().unwrap_or("(none)"), lc.count)?;
        }
        write!(f, "{}", self.summary)
    }
}
