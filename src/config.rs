// src/config.rs

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::process::date_parser::is_valid_format;

/// Run settings, as read from the YAML config file.
///
/// The two timestamp schemes are both optional here; which one applies is
/// decided per table by `process::normalize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub input_folder: PathBuf,
    pub output_file: PathBuf,
    #[serde(default)]
    pub lines_to_skip: usize,
    pub timestamp_column: String,
    #[serde(default)]
    pub timestamp_format: Option<String>,
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub time_column: Option<String>,
    #[serde(default)]
    pub time_format: Option<String>,
}

impl Settings {
    /// Load settings from `path`, resolve relative paths against the file's
    /// directory, and validate.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml_str(&text)
            .map_err(|e| MergeError::Configuration(format!("{}: {}", path.display(), e)))?;

        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let base = base.canonicalize().map_err(|source| MergeError::Io {
            path: base.to_path_buf(),
            source,
        })?;

        let settings = settings.resolve_paths(&base);
        debug!(
            input = %settings.input_folder.display(),
            output = %settings.output_file.display(),
            "resolved config paths"
        );
        settings.validate()?;
        Ok(settings)
    }

    /// Parse without touching paths or validating.
    pub fn from_yaml_str(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Make `input_folder` and `output_file` absolute, relative to `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        if self.input_folder.is_relative() {
            self.input_folder = base.join(&self.input_folder);
        }
        if self.output_file.is_relative() {
            self.output_file = base.join(&self.output_file);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(MergeError::Configuration(msg.to_string()));

        if self.timestamp_column.trim().is_empty() {
            return invalid("timestamp_column must not be empty");
        }
        if self.output_file.file_name().is_none() {
            return invalid("output_file must name a file");
        }
        if self.date_column.is_some() && self.date_format.is_none() {
            return invalid("date_column is set but date_format is missing");
        }
        if self.time_column.is_some() && self.time_format.is_none() {
            return invalid("time_column is set but time_format is missing");
        }
        if self.date_column.is_some() != self.time_column.is_some() {
            return invalid("date_column and time_column must be configured together");
        }
        if self.timestamp_format.is_none() && self.combined_columns().is_none() {
            return invalid(
                "either timestamp_format or date_column/time_column with their formats is required",
            );
        }
        for (key, fmt) in [
            ("timestamp_format", &self.timestamp_format),
            ("date_format", &self.date_format),
            ("time_format", &self.time_format),
        ] {
            if let Some(fmt) = fmt {
                if !is_valid_format(fmt) {
                    return Err(MergeError::Configuration(format!(
                        "{} {:?} is not a valid strftime format",
                        key, fmt
                    )));
                }
            }
        }
        Ok(())
    }

    /// The configured date and time column names, when both are set.
    pub fn combined_columns(&self) -> Option<(&str, &str)> {
        match (&self.date_column, &self.time_column) {
            (Some(d), Some(t)) => Some((d.as_str(), t.as_str())),
            _ => None,
        }
    }

    /// Format used to parse `"<date> <time>"` values.
    pub fn combined_format(&self) -> Option<String> {
        match (&self.date_format, &self.time_format) {
            (Some(d), Some(t)) => Some(format!("{} {}", d, t)),
            _ => None,
        }
    }

    /// Format every normalized timestamp is rendered with.
    pub fn output_format(&self) -> Option<String> {
        self.timestamp_format
            .clone()
            .or_else(|| self.combined_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    const FULL: &str = r#"
input_folder: data/raw
output_file: out/merged.csv
lines_to_skip: 2
timestamp_column: timestamp
timestamp_format: "%Y-%m-%d %H:%M:%S"
date_column: date
date_format: "%Y-%m-%d"
time_column: time
time_format: "%H:%M:%S"
"#;

    #[test]
    fn parses_all_keys() -> Result<()> {
        let s = Settings::from_yaml_str(FULL)?;
        assert_eq!(s.lines_to_skip, 2);
        assert_eq!(s.combined_columns(), Some(("date", "time")));
        assert_eq!(s.combined_format().as_deref(), Some("%Y-%m-%d %H:%M:%S"));
        assert_eq!(s.output_format().as_deref(), Some("%Y-%m-%d %H:%M:%S"));
        s.validate()?;
        Ok(())
    }

    #[test]
    fn optional_keys_default() -> Result<()> {
        let s = Settings::from_yaml_str(
            "input_folder: in\noutput_file: out.csv\ntimestamp_column: ts\ntimestamp_format: '%s'\n",
        )?;
        assert_eq!(s.lines_to_skip, 0);
        assert!(s.date_column.is_none());
        s.validate()?;
        Ok(())
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Settings::from_yaml_str(
            "input_folder: in\noutput_file: out.csv\ntimestamp_column: ts\nbogus: 1\n",
        );
        assert!(err.is_err());
    }

    #[test]
    fn validation_failures() -> Result<()> {
        let base = Settings::from_yaml_str(FULL)?;

        let mut s = base.clone();
        s.timestamp_column = " ".into();
        assert!(matches!(s.validate(), Err(MergeError::Configuration(_))));

        let mut s = base.clone();
        s.date_format = None;
        assert!(matches!(s.validate(), Err(MergeError::Configuration(_))));

        let mut s = base.clone();
        s.time_column = None;
        s.time_format = None;
        assert!(matches!(s.validate(), Err(MergeError::Configuration(_))));

        let mut s = base.clone();
        s.timestamp_format = None;
        s.date_column = None;
        s.date_format = None;
        s.time_column = None;
        s.time_format = None;
        assert!(matches!(s.validate(), Err(MergeError::Configuration(_))));

        let mut s = base.clone();
        s.time_format = Some("%H:%Q".into());
        assert!(matches!(s.validate(), Err(MergeError::Configuration(_))));

        // combined scheme alone is enough; output falls back to the combined format
        let mut s = base;
        s.timestamp_format = None;
        s.validate()?;
        assert_eq!(s.output_format().as_deref(), Some("%Y-%m-%d %H:%M:%S"));
        Ok(())
    }

    #[test]
    fn resolves_paths_relative_to_config_file() -> Result<()> {
        let dir = tempdir()?;
        let cfg = dir.path().join("merge.yaml");
        fs::write(&cfg, FULL)?;

        let s = Settings::from_yaml_file(&cfg)?;
        let base = dir.path().canonicalize()?;
        assert_eq!(s.input_folder, base.join("data/raw"));
        assert_eq!(s.output_file, base.join("out/merged.csv"));
        Ok(())
    }

    #[test]
    fn absolute_paths_are_kept() -> Result<()> {
        let mut s = Settings::from_yaml_str(FULL)?;
        let abs = std::env::temp_dir().join("elsewhere");
        s.input_folder = abs.clone();
        let s = s.resolve_paths(Path::new("/config/dir"));
        assert_eq!(s.input_folder, abs);
        assert_eq!(s.output_file, Path::new("/config/dir").join("out/merged.csv"));
        Ok(())
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = Settings::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, MergeError::Io { .. }));
    }
}
