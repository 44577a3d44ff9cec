// src/process/duplicates.rs
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use crate::process::merge::MergedTable;

/// Where a merged row came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOrigin {
    pub file: PathBuf,
    pub line: u64,
}

/// Rows sharing one timestamp, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub timestamp: String,
    pub rows: Vec<RowOrigin>,
}

/// Every timestamp that appears on more than one merged row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub timestamp_column: String,
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total rows involved in a conflict.
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    /// Log each conflicting group at `warn`.
    pub fn log(&self) {
        if self.is_empty() {
            return;
        }
        warn!(
            column = %self.timestamp_column,
            timestamps = self.groups.len(),
            rows = self.row_count(),
            "conflicting timestamps found"
        );
        for group in &self.groups {
            let origins: Vec<String> = group
                .rows
                .iter()
                .map(|o| format!("{}:{}", o.file.display(), o.line))
                .collect();
            warn!(timestamp = %group.timestamp, "duplicate at {}", origins.join(", "));
        }
    }
}

/// Scan `table` once and collect rows whose timestamp is shared.
///
/// Relies on `table` being sorted, so equal timestamps are adjacent.
pub fn find_duplicates(table: &MergedTable) -> DuplicateReport {
    let groups = table
        .rows
        .chunk_by(|a, b| a.timestamp.text == b.timestamp.text)
        .filter(|run| run.len() > 1)
        .map(|run| DuplicateGroup {
            timestamp: run[0].timestamp.text.clone(),
            rows: run
                .iter()
                .map(|r| RowOrigin {
                    file: table.sources[r.source].clone(),
                    line: r.line,
                })
                .collect(),
        })
        .collect();

    DuplicateReport {
        timestamp_column: table.timestamp_column.clone(),
        groups,
    }
}
