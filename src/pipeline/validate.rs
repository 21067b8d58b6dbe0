use crate::constants::{
    DEFAULT_API_ERROR_MESSAGE, LABEL_COLUMN, STATUS_SUCCESS, TIMESTAMP_COLUMN, X_COLUMN, Y_COLUMN,
    Z_COLUMN,
};
use crate::error::{IngestError, Result};
use crate::types::{Field, RawRecord, RawResponse, Reading, ReadingTable};
use serde_json::Value;
use tracing::{debug, instrument};

/// Check the envelope and turn its readings into a table, in API order.
#[instrument(skip(response))]
pub fn validate(response: RawResponse) -> Result<ReadingTable> {
    if !matches!(&response.status, Some(Value::String(s)) if s == STATUS_SUCCESS) {
        return Err(IngestError::Api { message: api_message(response.message) });
    }

    let records = records_from(response.readings)?;
    if records.is_empty() {
        return Err(IngestError::EmptyData);
    }

    let columns = collect_columns(&records);
    let rows: Vec<Reading> = records.into_iter().map(reading_from_record).collect();
    let table = ReadingTable::new(columns, rows);

    if table.is_empty() {
        return Err(IngestError::EmptyData);
    }
    debug!(rows = table.len(), columns = ?table.columns, "Built reading table");
    Ok(table)
}

fn api_message(message: Option<Value>) -> String {
    match message {
        None | Some(Value::Null) => DEFAULT_API_ERROR_MESSAGE.to_string(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn records_from(readings: Option<Value>) -> Result<Vec<RawRecord>> {
    let items = match readings {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(IngestError::Decode("'readings' is not an array".to_string()));
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(record) => Ok(record),
            _ => Err(IngestError::Decode(format!("reading {i} is not an object"))),
        })
        .collect()
}

/// Union of record keys in first-seen order
fn collect_columns(records: &[RawRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for key in records.iter().flat_map(|r| r.keys()) {
        if !columns.iter().any(|c| c == key) {
            columns.push(key.clone());
        }
    }
    columns
}

fn reading_from_record(mut record: RawRecord) -> Reading {
    let timestamp = Field::from_record(&record, TIMESTAMP_COLUMN);
    let x = Field::from_record(&record, X_COLUMN);
    let y = Field::from_record(&record, Y_COLUMN);
    let z = Field::from_record(&record, Z_COLUMN);
    let label = match record.get(LABEL_COLUMN) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    for key in [TIMESTAMP_COLUMN, X_COLUMN, Y_COLUMN, Z_COLUMN, LABEL_COLUMN] {
        record.shift_remove(key);
    }

    Reading { timestamp, x, y, z, label, extra: record }
}
