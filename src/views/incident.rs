use super::{AnalysisSelector, AnalysisView, TimeSpan, ViewOutcome, ViewReport};
use crate::constants::{BUMP_LABEL, POTHOLE_LABEL};
use crate::error::IngestError;
use crate::pipeline::filter_by_label;
use crate::summary::{describe, Summary};
use crate::types::ReadingTable;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Acceleration magnitude over rows with all three axes present
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnitudeStats {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    pub peak_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentReport {
    pub label: String,
    pub rows: usize,
    pub time_span: Option<TimeSpan>,
    pub magnitude: Option<MagnitudeStats>,
    pub summary: Summary,
}

/// Analysis of the rows carrying one road-event label
pub struct IncidentView {
    selector: AnalysisSelector,
    label: &'static str,
}

impl IncidentView {
    pub fn bump() -> Self {
        Self { selector: AnalysisSelector::Bump, label: BUMP_LABEL }
    }

    pub fn pothole() -> Self {
        Self { selector: AnalysisSelector::Pothole, label: POTHOLE_LABEL }
    }
}

impl AnalysisView for IncidentView {
    fn selector(&self) -> AnalysisSelector {
        self.selector
    }

    fn render(&self, table: &ReadingTable) -> ViewReport {
        let subset = filter_by_label(table, self.label);
        if subset.is_empty() {
            let notice = IngestError::EmptyFilterResult { label: self.label.to_string() };
            info!(label = self.label, "No matching readings, skipping view");
            return ViewReport::new(
                self.selector,
                ViewOutcome::Skipped { notice: notice.user_message() },
            );
        }

        let report = IncidentReport {
            label: self.label.to_string(),
            rows: subset.len(),
            time_span: TimeSpan::of(&subset),
            magnitude: magnitude_stats(&subset),
            summary: describe(&subset),
        };
        ViewReport::new(self.selector, ViewOutcome::Incident(report))
    }
}

pub fn magnitude_stats(table: &ReadingTable) -> Option<MagnitudeStats> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut peak: Option<(f64, Option<DateTime<Utc>>)> = None;

    for row in &table.rows {
        let Some(m) = row.magnitude() else { continue };
        count += 1;
        sum += m;
        if peak.map_or(true, |(max, _)| m > max) {
            peak = Some((m, row.timestamp.value().copied()));
        }
    }

    let (max, peak_at) = peak?;
    Some(MagnitudeStats { count, mean: sum / count as f64, max, peak_at })
}

impl fmt::Display for IncidentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "'{}' readings: {}", self.label, self.rows)?;
        if let Some(span) = &self.time_span {
            writeln!(f, "Time span: {span}")?;
        }
        match &self.magnitude {
            Some(m) => {
                write!(
                    f,
                    "Magnitude: mean {:.3}, peak {:.3} over {} complete samples",
                    m.mean, m.max, m.count
                )?;
                match m.peak_at {
                    Some(at) => writeln!(f, " (peak at {})", at.format("%Y-%m-%d %H:%M:%S%.3f"))?,
                    None => writeln!(f)?,
                }
            }
            None => writeln!(f, "Magnitude: no complete x/y/z samples")?,
        }
        write!(f, "{}", self.summary)
    }
}
