// src/process/merge.rs
use std::{collections::HashMap, path::PathBuf};
use tracing::{info, warn};

use crate::process::date_parser::Timestamp;
use crate::process::normalize::NormalizedTable;

/// All rows from every source, sorted by timestamp text.
#[derive(Debug)]
pub struct MergedTable {
    pub timestamp_column: String,
    /// Union of the non-timestamp columns, in first-seen order.
    pub columns: Vec<String>,
    /// Source files in the order they were merged; `MergedRow::source` indexes this.
    pub sources: Vec<PathBuf>,
    pub rows: Vec<MergedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub source: usize,
    pub line: u64,
    pub timestamp: Timestamp,
    /// One value per entry of `MergedTable::columns`; empty where the source
    /// file had no such column.
    pub values: Vec<String>,
}

impl MergedTable {
    /// Whether the lexicographic row order is also chronological.
    pub fn is_chronological(&self) -> bool {
        self.rows
            .windows(2)
            .all(|w| w[0].timestamp.parsed.sort_key() <= w[1].timestamp.parsed.sort_key())
    }
}

/// Concatenate `tables` and stable-sort by timestamp string.
///
/// Rows sharing a timestamp keep table order, then file order.
pub fn merge(tables: Vec<NormalizedTable>, timestamp_column: &str) -> MergedTable {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for table in &tables {
        for col in &table.columns {
            if !index.contains_key(col) {
                index.insert(col.clone(), columns.len());
                columns.push(col.clone());
            }
        }
    }

    let total: usize = tables.iter().map(|t| t.rows.len()).sum();
    let mut rows = Vec::with_capacity(total);
    let mut sources = Vec::with_capacity(tables.len());

    for (source, table) in tables.into_iter().enumerate() {
        if table.columns.len() != columns.len() {
            warn!(
                path = %table.source.display(),
                "columns differ from other files; missing values left empty"
            );
        }
        let positions: Vec<usize> = table.columns.iter().map(|c| index[c]).collect();
        for row in table.rows {
            let mut values = vec![String::new(); columns.len()];
            for (value, &pos) in row.values.into_iter().zip(&positions) {
                values[pos] = value;
            }
            rows.push(MergedRow {
                source,
                line: row.line,
                timestamp: row.timestamp,
                values,
            });
        }
        sources.push(table.source);
    }

    // sort_by is stable
    rows.sort_by(|a, b| a.timestamp.text.cmp(&b.timestamp.text));

    info!(
        files = sources.len(),
        rows = rows.len(),
        columns = columns.len() + 1,
        "merged"
    );
    MergedTable {
        timestamp_column: timestamp_column.to_string(),
        columns,
        sources,
        rows,
    }
}
