use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// One record of the `readings` array, field order preserved as received
pub type RawRecord = Map<String, Value>;

/// Decoded JSON envelope as returned by the source API.
///
/// Fields are kept as loose JSON so a rejected envelope is reported by its
/// status even when the rest of it is malformed; shapes are checked later.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub readings: Option<Value>,
}

impl RawResponse {
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let mut take = |key: &str| map.remove(key).filter(|v| !v.is_null());
        Self {
            status: take("status"),
            message: take("message"),
            readings: take("readings"),
        }
    }
}

/// State of a single typed cell.
///
/// `Missing` is the marker for a value that was present but could not be
/// coerced; `Absent` means the record never had the field at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// As received, not yet coerced
    Raw(Value),
    Value(T),
    Missing,
    Absent,
}

impl<T> Field<T> {
    pub fn from_record(record: &RawRecord, key: &str) -> Self {
        match record.get(key) {
            Some(value) => Field::Raw(value.clone()),
            None => Field::Absent,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Field::Raw(_))
    }

    /// Coerce a raw cell; every other state passes through unchanged.
    pub fn coerce_with(self, coerce: impl FnOnce(&Value) -> Option<T>) -> Self {
        match self {
            Field::Raw(raw) => coerce(&raw).map_or(Field::Missing, Field::Value),
            other => other,
        }
    }
}

// Missing and absent cells both render as null; raw cells keep their JSON.
impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Field::Raw(raw) => raw.serialize(serializer),
            Field::Value(v) => v.serialize(serializer),
            Field::Missing | Field::Absent => serializer.serialize_none(),
        }
    }
}

/// One timestamped accelerometer sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: Field<DateTime<Utc>>,
    pub x: Field<f64>,
    pub y: Field<f64>,
    pub z: Field<f64>,
    pub label: Option<String>,
    /// Every other field of the source record, verbatim
    #[serde(flatten)]
    pub extra: RawRecord,
}

impl Reading {
    pub fn label_is(&self, label: &str) -> bool {
        self.label.as_deref() == Some(label)
    }

    /// Cell of a numeric column by name
    pub fn axis(&self, column: &str) -> Option<&Field<f64>> {
        match column {
            crate::constants::X_COLUMN => Some(&self.x),
            crate::constants::Y_COLUMN => Some(&self.y),
            crate::constants::Z_COLUMN => Some(&self.z),
            _ => None,
        }
    }

    /// Euclidean norm of the acceleration vector, if all three axes are values
    pub fn magnitude(&self) -> Option<f64> {
        let (x, y, z) = (self.x.value()?, self.y.value()?, self.z.value()?);
        Some((x * x + y * y + z * z).sqrt())
    }
}

/// Ordered readings with the column names they arrived with
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReadingTable {
    pub columns: Vec<String>,
    pub rows: Vec<Reading>,
}

impl ReadingTable {
    pub fn new(columns: Vec<String>, rows: Vec<Reading>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest valid timestamps
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut stamps = self.rows.iter().filter_map(|r| r.timestamp.value().copied());
        let first = stamps.next()?;
        Some(stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}
