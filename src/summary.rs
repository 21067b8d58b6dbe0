//! Descriptive statistics over the numeric reading columns.

use crate::constants::NUMERIC_COLUMNS;
use crate::types::ReadingTable;
use serde::Serialize;
use std::fmt;

/// count/mean/std/min/quartiles/max for one column.
///
/// `std` is the sample standard deviation and needs two values; every
/// statistic except `count` is `None` for a column with no values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn from_values(column: &str, mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        let count = values.len();
        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
        let std = match mean {
            Some(m) if count > 1 => {
                let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
                Some((ss / (count - 1) as f64).sqrt())
            }
            _ => None,
        };

        Self {
            column: column.to_string(),
            count,
            mean,
            std,
            min: values.first().copied(),
            p25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            p75: quantile(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

/// Linear interpolation between closest ranks over sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub columns: Vec<ColumnStats>,
}

impl Summary {
    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.column == name)
    }
}

pub fn describe(table: &ReadingTable) -> Summary {
    let columns = NUMERIC_COLUMNS
        .iter()
        .map(|&name| {
            let values = table
                .rows
                .iter()
                .filter_map(|r| r.axis(name).and_then(|f| f.value()).copied())
                .collect();
            ColumnStats::from_values(name, values)
        })
        .collect();
    Summary { rows: table.len(), columns }
}

/// Occurrences per label, in first-seen order
pub fn label_counts(table: &ReadingTable) -> Vec<(Option<String>, usize)> {
    let mut counts: Vec<(Option<String>, usize)> = Vec::new();
    for row in &table.rows {
        match counts.iter_mut().find(|(label, _)| *label == row.label) {
            Some((_, n)) => *n += 1,
            None => counts.push((row.label.clone(), 1)),
        }
    }
    counts
}

fn cell(v: Option<f64>) -> String {
    v.map_or_else(|| "NaN".to_string(), |v| format!("{v:.6}"))
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}", "")?;
        for c in &self.columns {
            write!(f, " {:>14}", c.column)?;
        }
        writeln!(f)?;

        let rows: [(&str, fn(&ColumnStats) -> String); 8] = [
            ("count", |c| format!("{:.6}", c.count as f64)),
            ("mean", |c| cell(c.mean)),
            ("std", |c| cell(c.std)),
            ("min", |c| cell(c.min)),
            ("25%", |c| cell(c.p25)),
            ("50%", |c| cell(c.median)),
            ("75%", |c| cell(c.p75)),
            ("max", |c| cell(c.max)),
        ];
        for (name, stat) in rows {
            write!(f, "{name:>6}")?;
            for c in &self.columns {
                write!(f, " {:>14}", stat(c))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, RawRecord, Reading};

    fn row(x: Field<f64>, label: Option<&str>) -> Reading {
        Reading {
            timestamp: Field::Absent,
            x,
            y: Field::Value(1.0),
            z: Field::Missing,
            label: label.map(str::to_string),
            extra: RawRecord::new(),
        }
    }

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map_or(false, |a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_column_stats_match_hand_computation() {
        let s = ColumnStats::from_values("x", vec![4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert!(approx(s.mean, 2.5));
        // sample variance = 5/3
        assert!(approx(s.std, (5.0f64 / 3.0).sqrt()));
        assert!(approx(s.min, 1.0));
        assert!(approx(s.p25, 1.75));
        assert!(approx(s.median, 2.5));
        assert!(approx(s.p75, 3.25));
        assert!(approx(s.max, 4.0));
    }

    #[test]
    fn test_single_value_has_no_std() {
        let s = ColumnStats::from_values("x", vec![7.0]);
        assert_eq!(s.count, 1);
        assert!(approx(s.mean, 7.0));
        assert_eq!(s.std, None);
        assert!(approx(s.median, 7.0));
    }

    #[test]
    fn test_describe_skips_missing_cells() {
        let table = ReadingTable::new(
            vec!["x".into(), "y".into(), "z".into()],
            vec![
                row(Field::Value(2.0), Some("bump")),
                row(Field::Missing, None),
                row(Field::Value(4.0), Some("bump")),
            ],
        );
        let summary = describe(&table);
        assert_eq!(summary.rows, 3);
        let x = summary.column("x").unwrap();
        assert_eq!(x.count, 2);
        assert!(approx(x.mean, 3.0));
        assert_eq!(summary.column("y").unwrap().count, 3);

        let z = summary.column("z").unwrap();
        assert_eq!(z.count, 0);
        assert_eq!(z.mean, None);
        assert_eq!(z.max, None);
    }

    #[test]
    fn test_label_counts_in_first_seen_order() {
        let table = ReadingTable::new(
            vec![],
            vec![
                row(Field::Value(1.0), Some("pothole")),
                row(Field::Value(1.0), Some("bump")),
                row(Field::Value(1.0), None),
                row(Field::Value(1.0), Some("pothole")),
            ],
        );
        let counts = label_counts(&table);
        assert_eq!(
            counts,
            vec![
                (Some("pothole".to_string()), 2),
                (Some("bump".to_string()), 1),
                (None, 1),
            ]
        );
    }

    #[test]
    fn test_display_has_all_statistics() {
        let summary = Summary {
            rows: 1,
            columns: vec![ColumnStats::from_values("x", vec![1.0])],
        };
        let text = summary.to_string();
        for stat in ["count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
            assert!(text.contains(stat), "missing {stat}");
        }
        assert!(text.contains("NaN"));
    }
}
