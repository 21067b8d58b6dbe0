use crate::constants::SUCCESS_NOTICE;
use crate::error::{IngestError, Result};
use crate::pipeline::IngestionPipeline;
use crate::summary::{describe, Summary};
use crate::types::{Field, Reading, ReadingTable};
use crate::views::{render_view, AnalysisSelector, ViewReport};
use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Write as _};
use tracing::instrument;

/// One fetched, normalized dataset and the source it came from.
pub struct Dashboard {
    source: String,
    table: ReadingTable,
}

impl Dashboard {
    /// Run one fetch cycle. `source` is the caller-supplied location; a
    /// missing or blank one fails before any request is made.
    #[instrument(skip(pipeline))]
    pub fn load(pipeline: &IngestionPipeline, source: Option<&str>) -> Result<Self> {
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(IngestError::MissingSource)?;
        let table = pipeline.run(source)?;
        Ok(Self { source: source.to_string(), table })
    }

    pub fn from_table(source: impl Into<String>, table: ReadingTable) -> Self {
        Self { source: source.into(), table }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn table(&self) -> &ReadingTable {
        &self.table
    }

    pub fn summary(&self) -> Summary {
        describe(&self.table)
    }

    pub fn report(&self, selector: AnalysisSelector) -> DashboardReport {
        let analysis = render_view(selector, &self.table);
        let notice = match &analysis.outcome {
            crate::views::ViewOutcome::Skipped { notice } => notice.clone(),
            _ => SUCCESS_NOTICE.to_string(),
        };
        DashboardReport {
            source: self.source.clone(),
            columns: self.table.columns.clone(),
            rows: self.table.rows.clone(),
            summary: self.summary(),
            analysis,
            notice,
        }
    }
}

/// Everything one page of the dashboard shows
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub source: String,
    pub columns: Vec<String>,
    pub rows: Vec<Reading>,
    pub summary: Summary,
    pub analysis: ViewReport,
    pub notice: String,
}

impl DashboardReport {
    /// Text rendering with at most `limit` table rows
    pub fn render_text(&self, limit: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Fetching data from API: {}", self.source);
        let _ = writeln!(out);
        let _ = writeln!(out, "== Fetched Sensor Data ==");
        out.push_str(&format_rows(&self.columns, &self.rows, limit));
        let _ = writeln!(out);
        let _ = writeln!(out, "== Data Summary ==");
        let _ = write!(out, "{}", self.summary);
        let _ = writeln!(out);
        let _ = write!(out, "{}", self.analysis);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.notice);
        out
    }
}

fn format_field<T: fmt::Display>(field: &Field<T>) -> String {
    match field {
        Field::Value(v) => v.to_string(),
        Field::Raw(raw) => format_json(raw),
        Field::Missing => "NaN".to_string(),
        Field::Absent => String::new(),
    }
}

fn format_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_cell(row: &Reading, column: &str) -> String {
    match column {
        crate::constants::TIMESTAMP_COLUMN => match &row.timestamp {
            Field::Value(ts) => ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            other => format_field(other),
        },
        crate::constants::X_COLUMN => format_field(&row.x),
        crate::constants::Y_COLUMN => format_field(&row.y),
        crate::constants::Z_COLUMN => format_field(&row.z),
        crate::constants::LABEL_COLUMN => row.label.clone().unwrap_or_default(),
        other => row.extra.get(other).map(format_json).unwrap_or_default(),
    }
}

/// Fixed-width table of the first `limit` rows, index column first
pub fn format_rows(columns: &[String], rows: &[Reading], limit: usize) -> String {
    let shown = &rows[..rows.len().min(limit)];
    let cells: Vec<Vec<String>> = shown
        .iter()
        .map(|r| columns.iter().map(|c| format_cell(r, c)).collect())
        .collect();

    let index_width = shown.len().saturating_sub(1).to_string().len();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = write!(out, "{:>index_width$}", "");
    for (c, &w) in columns.iter().zip(&widths) {
        let _ = write!(out, "  {c:>w$}");
    }
    let _ = writeln!(out);
    for (i, row) in cells.iter().enumerate() {
        let _ = write!(out, "{i:>index_width$}");
        for (cell, &w) in row.iter().zip(&widths) {
            let _ = write!(out, "  {cell:>w$}");
        }
        let _ = writeln!(out);
    }
    if rows.len() > shown.len() {
        let _ = writeln!(out, "... {} more rows", rows.len() - shown.len());
    }
    let _ = writeln!(out, "[{} rows x {} columns]", rows.len(), columns.len());
    out
}
