use std::path::PathBuf;

/// One CSV file as read from disk, before any timestamp handling.
#[derive(Debug)]
pub struct RawTable {
    /// File the table was loaded from.
    pub source: PathBuf,
    /// Column names, from the header row after the skipped lines.
    pub headers: Vec<String>,
    /// Data rows in file order.
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source file where the record starts.
    pub line: u64,
    /// One String per header column.
    pub fields: Vec<String>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}
