use crate::constants::{BUMP_LABEL, POTHOLE_LABEL};
use crate::types::ReadingTable;
use serde::Serialize;

/// Rows whose label equals `label`, in their original order. The input is
/// left untouched; an empty result is a valid outcome.
pub fn filter_by_label(table: &ReadingTable, label: &str) -> ReadingTable {
    let rows = table
        .rows
        .iter()
        .filter(|r| r.label_is(label))
        .cloned()
        .collect();
    ReadingTable::new(table.columns.clone(), rows)
}

/// A table split by the labels that have dedicated analyses
#[derive(Debug, Clone, Serialize)]
pub struct LabelPartition {
    pub bump: ReadingTable,
    pub pothole: ReadingTable,
    pub other: ReadingTable,
}

impl LabelPartition {
    pub fn total(&self) -> usize {
        self.bump.len() + self.pothole.len() + self.other.len()
    }
}

pub fn partition_by_label(table: &ReadingTable) -> LabelPartition {
    let other_rows = table
        .rows
        .iter()
        .filter(|r| !r.label_is(BUMP_LABEL) && !r.label_is(POTHOLE_LABEL))
        .cloned()
        .collect();

    LabelPartition {
        bump: filter_by_label(table, BUMP_LABEL),
        pothole: filter_by_label(table, POTHOLE_LABEL),
        other: ReadingTable::new(table.columns.clone(), other_rows),
    }
}
