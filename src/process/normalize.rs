// src/process/normalize.rs
use std::path::PathBuf;
use tracing::debug;

use crate::config::Settings;
use crate::error::{MergeError, Result};
use crate::process::date_parser::{parse_with_format, Timestamp};
use crate::process::raw_table::RawTable;

/// How a table's timestamp is derived, resolved once per table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampScheme {
    /// Join `date` and `time` columns with a space and parse with `format`.
    Combined {
        date: usize,
        time: usize,
        format: String,
    },
    /// Re-parse an existing timestamp column with `format`.
    Existing { column: usize, format: String },
}

impl TimestampScheme {
    /// Pick the scheme for `table`. Date+time columns win over an existing
    /// timestamp column.
    pub fn resolve(table: &RawTable, settings: &Settings) -> Result<Self> {
        if let (Some((date_col, time_col)), Some(format)) =
            (settings.combined_columns(), settings.combined_format())
        {
            if let (Some(date), Some(time)) =
                (table.column_index(date_col), table.column_index(time_col))
            {
                return Ok(TimestampScheme::Combined { date, time, format });
            }
        }

        if let (Some(column), Some(format)) = (
            table.column_index(&settings.timestamp_column),
            settings.timestamp_format.clone(),
        ) {
            return Ok(TimestampScheme::Existing { column, format });
        }

        Err(MergeError::MissingTimestampFields {
            path: table.source.clone(),
            timestamp_column: settings.timestamp_column.clone(),
            date_column: settings.date_column.clone(),
            time_column: settings.time_column.clone(),
        })
    }

    /// Source columns that don't survive into the normalized table.
    fn consumed_columns(&self, table: &RawTable, timestamp_column: &str) -> Vec<usize> {
        match self {
            TimestampScheme::Combined { date, time, .. } => {
                let mut cols = vec![*date, *time];
                // a stale timestamp column is replaced by the derived one
                if let Some(ts) = table.column_index(timestamp_column) {
                    cols.push(ts);
                }
                cols
            }
            TimestampScheme::Existing { column, .. } => vec![*column],
        }
    }

    fn raw_value(&self, fields: &[String]) -> String {
        match self {
            TimestampScheme::Combined { date, time, .. } => {
                format!("{} {}", fields[*date], fields[*time])
            }
            TimestampScheme::Existing { column, .. } => fields[*column].clone(),
        }
    }

    fn format(&self) -> &str {
        match self {
            TimestampScheme::Combined { format, .. } | TimestampScheme::Existing { format, .. } => {
                format
            }
        }
    }

    fn column_label(&self, table: &RawTable) -> String {
        match self {
            TimestampScheme::Combined { date, time, .. } => {
                format!("{}+{}", table.headers[*date], table.headers[*time])
            }
            TimestampScheme::Existing { column, .. } => table.headers[*column].clone(),
        }
    }
}

/// A table holding exactly one canonical timestamp column plus the remaining
/// source columns as raw text.
#[derive(Debug)]
pub struct NormalizedTable {
    pub source: PathBuf,
    pub timestamp_column: String,
    /// Non-timestamp columns, in source order.
    pub columns: Vec<String>,
    pub rows: Vec<NormalizedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub line: u64,
    pub timestamp: Timestamp,
    /// One value per entry of `NormalizedTable::columns`.
    pub values: Vec<String>,
}

/// Derive the canonical timestamp column for `table`.
pub fn normalize(table: RawTable, settings: &Settings) -> Result<NormalizedTable> {
    let scheme = TimestampScheme::resolve(&table, settings)?;
    let output_format = settings.output_format().ok_or_else(|| {
        MergeError::Configuration("no timestamp output format configured".to_string())
    })?;

    let consumed = scheme.consumed_columns(&table, &settings.timestamp_column);
    let keep: Vec<usize> = (0..table.headers.len())
        .filter(|i| !consumed.contains(i))
        .collect();
    let columns: Vec<String> = keep.iter().map(|&i| table.headers[i].clone()).collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let raw = scheme.raw_value(&row.fields);
        let parsed =
            parse_with_format(&raw, scheme.format()).ok_or_else(|| MergeError::TimestampParse {
                path: table.source.clone(),
                line: row.line,
                column: scheme.column_label(&table),
                value: raw.clone(),
                format: scheme.format().to_string(),
            })?;
        let text = parsed.render(&output_format).map_err(|_| {
            MergeError::Configuration(format!(
                "{} line {}: output format {:?} cannot render {:?}",
                table.source.display(),
                row.line,
                output_format,
                raw
            ))
        })?;

        rows.push(NormalizedRow {
            line: row.line,
            timestamp: Timestamp { parsed, text },
            values: keep.iter().map(|&i| row.fields[i].clone()).collect(),
        });
    }

    debug!(
        path = %table.source.display(),
        scheme = ?scheme,
        rows = rows.len(),
        "normalized"
    );
    Ok(NormalizedTable {
        source: table.source,
        timestamp_column: settings.timestamp_column.clone(),
        columns,
        rows,
    })
}
