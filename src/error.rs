// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input folder {0} does not exist")]
    NotFound(PathBuf),

    #[error("no .csv files found in {0}")]
    EmptyInput(PathBuf),

    #[error("{path} line {line}: {message}")]
    MalformedInput {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("{path} line {line}: cannot parse {value:?} in column {column:?} with format {format:?}")]
    TimestampParse {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
        format: String,
    },

    #[error("{path} has {}", missing_fields(.timestamp_column, .date_column, .time_column))]
    MissingTimestampFields {
        path: PathBuf,
        timestamp_column: String,
        date_column: Option<String>,
        time_column: Option<String>,
    },

    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    /// Everything except an empty input folder aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MergeError::EmptyInput(_))
    }
}

fn missing_fields(
    timestamp_column: &str,
    date_column: &Option<String>,
    time_column: &Option<String>,
) -> String {
    match (date_column, time_column) {
        (Some(date), Some(time)) => format!(
            "neither {:?}+{:?} columns nor a parseable {:?} column",
            date, time, timestamp_column
        ),
        _ => format!(
            "no {:?} column to parse with timestamp_format",
            timestamp_column
        ),
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
