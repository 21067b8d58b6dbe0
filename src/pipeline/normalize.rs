use crate::types::{Field, Reading, ReadingTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, instrument};

// Offset-less layouts, read as UTC
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Cells that were present but turned into the missing-marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoercionReport {
    pub timestamps_missing: usize,
    pub numbers_missing: usize,
}

impl CoercionReport {
    pub fn total(&self) -> usize {
        self.timestamps_missing + self.numbers_missing
    }
}

/// Coerce timestamp and axis columns. Rows are never dropped or reordered,
/// and already coerced cells are left as they are.
pub fn normalize(table: ReadingTable) -> ReadingTable {
    normalize_with_report(table).0
}

#[instrument(skip(table), fields(rows = table.len()))]
pub fn normalize_with_report(table: ReadingTable) -> (ReadingTable, CoercionReport) {
    let mut report = CoercionReport::default();
    let ReadingTable { columns, rows } = table;

    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| normalize_reading(i, row, &mut report))
        .collect();

    if report.total() > 0 {
        debug!(
            timestamps_missing = report.timestamps_missing,
            numbers_missing = report.numbers_missing,
            "Coerced unparseable cells to missing"
        );
    }
    (ReadingTable::new(columns, rows), report)
}

fn normalize_reading(index: usize, row: Reading, report: &mut CoercionReport) -> Reading {
    let Reading { timestamp, x, y, z, label, extra } = row;

    let was_raw = timestamp.is_raw();
    let timestamp = timestamp.coerce_with(parse_timestamp);
    if was_raw && timestamp.is_missing() {
        debug!(row = index, "Unparseable timestamp");
        report.timestamps_missing += 1;
    }

    let mut coerce_axis = |cell: Field<f64>| {
        let was_raw = cell.is_raw();
        let cell = cell.coerce_with(coerce_number);
        if was_raw && cell.is_missing() {
            report.numbers_missing += 1;
        }
        cell
    };
    let (x, y, z) = (coerce_axis(x), coerce_axis(y), coerce_axis(z));

    Reading { timestamp, x, y, z, label, extra }
}

/// Coerce a JSON value to a finite float; anything else is missing.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Parse a JSON timestamp into UTC.
///
/// Strings may be RFC 3339, ISO-8601 without an offset (taken as UTC, `T`
/// or space separator), or a bare date. Numbers are Unix epoch seconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => {
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round() as u32;
            Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
