// src/process/mod.rs
pub mod date_parser;
pub mod duplicates;
pub mod load;
pub mod merge;
pub mod normalize;
pub mod raw_table;
pub mod write;

use serde::Serialize;
use std::{path::PathBuf, time::Instant};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{MergeError, Result};
use duplicates::DuplicateReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub rows: usize,
}

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileSummary>,
    pub total_rows: usize,
    /// `None` when the input folder held nothing to merge.
    pub output: Option<PathBuf>,
    pub duplicates: DuplicateReport,
}

impl RunSummary {
    fn nothing_to_do(settings: &Settings) -> Self {
        Self {
            files: Vec::new(),
            total_rows: 0,
            output: None,
            duplicates: DuplicateReport {
                timestamp_column: settings.timestamp_column.clone(),
                ..Default::default()
            },
        }
    }
}

/// Load, normalize, merge, report and write, in that order.
///
/// Any failure aborts the whole run before the output is written; an empty
/// input folder is a successful no-op.
#[tracing::instrument(level = "info", skip(settings), fields(input = %settings.input_folder.display()))]
pub fn run(settings: &Settings) -> Result<RunSummary> {
    let start = Instant::now();

    let sources = match load::discover_sources(&settings.input_folder, Some(&settings.output_file))
    {
        Ok(sources) => sources,
        Err(e @ MergeError::EmptyInput(_)) => {
            info!("{}; nothing to merge", e);
            return Ok(RunSummary::nothing_to_do(settings));
        }
        Err(e) => return Err(e),
    };
    info!("{} files to merge", sources.len());

    let raw_tables = sources
        .iter()
        .map(|p| load::load_table(p, settings.lines_to_skip))
        .collect::<Result<Vec<_>>>()?;

    let tables = raw_tables
        .into_iter()
        .map(|t| normalize::normalize(t, settings))
        .collect::<Result<Vec<_>>>()?;
    let files: Vec<FileSummary> = tables
        .iter()
        .map(|t| FileSummary {
            path: t.source.clone(),
            rows: t.rows.len(),
        })
        .collect();

    let merged = merge::merge(tables, &settings.timestamp_column);
    if !merged.is_chronological() {
        warn!(
            format = ?settings.output_format(),
            "timestamp format does not sort chronologically; output follows text order"
        );
    }

    let duplicates = duplicates::find_duplicates(&merged);
    duplicates.log();

    write::write_merged(&merged, &settings.output_file)?;

    info!(
        rows = merged.rows.len(),
        elapsed = ?start.elapsed(),
        "wrote {}",
        settings.output_file.display()
    );
    Ok(RunSummary {
        files,
        total_rows: merged.rows.len(),
        output: Some(settings.output_file.clone()),
        duplicates,
    })
}
