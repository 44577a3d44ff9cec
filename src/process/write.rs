// src/process/write.rs
use csv::WriterBuilder;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::{MergeError, Result};
use crate::process::merge::MergedTable;

/// Write `table` as CSV to `path`, timestamp column first, with a header row.
///
/// Output goes to a hidden sibling temp file that is renamed over `path`, so
/// a failed write never leaves a partial file behind.
#[tracing::instrument(level = "info", skip(table, path), fields(path = %path.as_ref().display()))]
pub fn write_merged<P: AsRef<Path>>(table: &MergedTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let write_err = |source: io::Error| MergeError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp_path = temp_path_for(path);
    if let Err(e) = write_csv(table, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_err(e)
    })?;

    info!(rows = table.rows.len(), "wrote merged csv");
    Ok(())
}

fn write_csv(table: &MergedTable, path: &Path) -> io::Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;

    wtr.write_record(
        std::iter::once(table.timestamp_column.as_str())
            .chain(table.columns.iter().map(String::as_str)),
    )?;
    for row in &table.rows {
        wtr.write_record(
            std::iter::once(row.timestamp.text.as_str())
                .chain(row.values.iter().map(String::as_str)),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merged.csv".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
