// src/process/load.rs
use csv::ReaderBuilder;
use glob::{glob_with, MatchOptions, Pattern};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::error::{MergeError, Result};
use crate::process::raw_table::{RawRow, RawTable};

/// List the `.csv` files directly inside `folder`, sorted by name.
///
/// `exclude` is skipped if it shows up in the listing, so an output file that
/// lives next to its inputs is never merged into itself on a re-run.
#[tracing::instrument(level = "debug", skip(folder, exclude), fields(folder = %folder.as_ref().display()))]
pub fn discover_sources<P: AsRef<Path>>(folder: P, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(MergeError::NotFound(folder.to_path_buf()));
    }

    let folder_str = folder.to_str().ok_or_else(|| {
        MergeError::Configuration(format!(
            "input folder {} is not valid UTF-8",
            folder.display()
        ))
    })?;
    let pattern = format!("{}/*.csv", Pattern::escape(folder_str));
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let excluded = exclude.and_then(|p| p.canonicalize().ok());

    let mut paths: Vec<PathBuf> = glob_with(&pattern, options)
        .map_err(|e| MergeError::Configuration(format!("bad input folder pattern: {}", e)))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|p| p.is_file())
        .filter(|p| match (&excluded, p.canonicalize()) {
            (Some(ex), Ok(c)) if *ex == c => {
                info!(path = %p.display(), "skipping output file found in input folder");
                false
            }
            _ => true,
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(MergeError::EmptyInput(folder.to_path_buf()));
    }
    debug!("found {} csv files", paths.len());
    Ok(paths)
}

/// Read one CSV file into a `RawTable`, discarding the first `lines_to_skip`
/// lines before the header row.
///
/// Any parse problem fails the whole file; there is no best-effort mode.
pub fn load_table<P: AsRef<Path>>(path: P, lines_to_skip: usize) -> Result<RawTable> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| MergeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let body = skip_lines(strip_bom(&data), lines_to_skip);
    let line_offset = lines_to_skip as u64;
    let malformed = |line: u64, message: String| MergeError::MalformedInput {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(body);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| malformed(csv_line(&e) + line_offset, e.to_string()))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    if headers.is_empty() {
        return Err(malformed(
            line_offset + 1,
            format!("no header row after skipping {} lines", lines_to_skip),
        ));
    }
    if let Some(dup) = headers
        .iter()
        .enumerate()
        .find(|(i, h)| headers[..*i].contains(h))
        .map(|(_, h)| h)
    {
        return Err(malformed(
            line_offset + 1,
            format!("duplicate column {:?} in header", dup),
        ));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| malformed(csv_line(&e) + line_offset, e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0) + line_offset;
        rows.push(RawRow {
            line,
            fields: record.iter().map(|s| s.to_string()).collect(),
        });
    }

    debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "loaded"
    );
    Ok(RawTable {
        source: path.to_path_buf(),
        headers,
        rows,
    })
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data)
}

/// Drop the first `n` `\n`-terminated lines.
fn skip_lines(data: &[u8], n: usize) -> &[u8] {
    let mut rest = data;
    for _ in 0..n {
        match rest.iter().position(|&b| b == b'\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return &[],
        }
    }
    rest
}

fn csv_line(e: &csv::Error) -> u64 {
    e.position().map(|p| p.line()).unwrap_or(0)
}
