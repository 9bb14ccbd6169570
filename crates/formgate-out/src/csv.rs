//! CSV file sink
//!
//! One record per submission, RFC 4180 quoting, CRLF line ends. The header
//! is written when the file is created.

use formgate_core::{FileSink, FormError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct CsvFileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records currently stored, header included.
    pub fn records(&self) -> Result<Vec<Vec<String>>, FormError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| FormError::Sink(format!("cannot read {}: {}", self.path.display(), e)))?;
        Ok(parse(&content))
    }
}

impl FileSink for CsvFileSink {
    fn is_writable(&self) -> bool {
        if self.path.exists() {
            return OpenOptions::new().append(true).open(&self.path).is_ok();
        }
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::metadata(parent)
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }

    fn contains_submitter(&self, submitter: &str) -> Result<bool, FormError> {
        Ok(self
            .records()?
            .iter()
            .skip(1)
            .any(|record| record.first().map(String::as_str) == Some(submitter)))
    }

    fn append(&self, header: &[String], row: &[String]) -> Result<(), FormError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FormError::Sink(format!("cannot open {}: {}", self.path.display(), e)))?;

        let is_new = file.metadata().map(|m| m.len() == 0).unwrap_or(true);
        let mut out = String::new();
        if is_new {
            out.push_str(&format_record(header));
        }
        out.push_str(&format_record(row));

        file.write_all(out.as_bytes())
            .map_err(|e| FormError::Sink(format!("cannot write {}: {}", self.path.display(), e)))?;

        tracing::debug!(path = %self.path.display(), header = is_new, "row appended");
        Ok(())
    }
}

// ============================================================================
// Format
// ============================================================================

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// One record with its CRLF terminator.
pub fn format_record(cells: &[String]) -> String {
    let mut line = cells.iter().map(|c| quote(c)).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

/// Parse CSV content; quoted cells may span lines.
pub fn parse(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut cell)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut cell));
                records.push(std::mem::take(&mut record));
            }
            _ => cell.push(c),
        }
    }
    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        records.push(record);
    }
    records
}
