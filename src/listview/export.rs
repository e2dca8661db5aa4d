use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::record::Listable;
use crate::error::{RecliqError, Result};

pub const CSV_MIME: &str = "text/csv;charset=utf-8;";

/// Which records an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    /// Only the page currently shown
    #[default]
    Page,
    /// Every record passing the current filters, sorted
    Filtered,
    /// The whole record store, in store order
    All,
}

impl FromStr for ExportScope {
    type Err = RecliqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "page" => Ok(ExportScope::Page),
            "filtered" => Ok(ExportScope::Filtered),
            "all" => Ok(ExportScope::All),
            _ => Err(RecliqError::InvalidChoice {
                what: "export scope",
                value: s.to_string(),
                expected: "page, filtered, all",
            }),
        }
    }
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportScope::Page => "page",
            ExportScope::Filtered => "filtered",
            ExportScope::All => "all",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvQuoting {
    /// Quote fields containing a comma, quote or newline; double embedded quotes
    #[default]
    Rfc4180,
    /// Plain comma joins with no escaping
    Legacy,
}

impl FromStr for CsvQuoting {
    type Err = RecliqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rfc4180" => Ok(CsvQuoting::Rfc4180),
            "legacy" => Ok(CsvQuoting::Legacy),
            _ => Err(RecliqError::InvalidChoice {
                what: "CSV quoting",
                value: s.to_string(),
                expected: "rfc4180, legacy",
            }),
        }
    }
}

/// A CSV column: header label plus the accessor producing the cell text.
pub struct Column<T> {
    pub header: String,
    accessor: Box<dyn Fn(&T) -> String>,
}

impl<T> Column<T> {
    pub fn new(header: impl Into<String>, accessor: impl Fn(&T) -> String + 'static) -> Self {
        Self {
            header: header.into(),
            accessor: Box::new(accessor),
        }
    }

    pub fn cell(&self, record: &T) -> String {
        (self.accessor)(record)
    }
}

impl<T: Listable + 'static> Column<T> {
    /// Column reading a named field; absent fields export as empty cells.
    pub fn field(header: impl Into<String>, name: &'static str) -> Self {
        Self::new(header, move |record: &T| {
            record.field(name).map(|v| v.to_string()).unwrap_or_default()
        })
    }
}

/// Serialize `records` as CSV: a header line then one line per record, each ending in `\n`.
pub fn to_csv<T>(records: &[&T], columns: &[Column<T>], quoting: CsvQuoting) -> Result<String> {
    let headers: Vec<&str> = columns.iter().map(|c| c.header.as_str()).collect();
    let rows = records
        .iter()
        .map(|record| columns.iter().map(|c| c.cell(record)).collect::<Vec<_>>());

    match quoting {
        CsvQuoting::Legacy => {
            let mut out = headers.join(",");
            out.push('\n');
            for row in rows {
                out.push_str(&row.join(","));
                out.push('\n');
            }
            Ok(out)
        }
        CsvQuoting::Rfc4180 => {
            let mut writer = csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(Vec::new());
            writer.write_record(&headers)?;
            for row in rows {
                writer.write_record(&row)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| RecliqError::Io(e.into_error()))?;
            String::from_utf8(bytes).map_err(|e| {
                RecliqError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })
        }
    }
}

/// `<subject>-<description>.csv`, e.g. `enterprise-payments.csv`
pub fn csv_filename(subject: &str, description: &str) -> String {
    format!("{subject}-{description}.csv")
}

/// Delivers bytes as a named file.
pub trait FileSink {
    fn deliver(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes delivered files into a directory, creating it when needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FileSink for DirectorySink {
    fn deliver(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), mime, size = bytes.len(), "delivered file");
        Ok(path)
    }
}

/// Keeps delivered files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<DeliveredFile>,
}

#[derive(Debug, Clone)]
pub struct DeliveredFile {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileSink for MemorySink {
    fn deliver(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.files.push(DeliveredFile {
            filename: filename.to_string(),
            mime: mime.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(PathBuf::from(filename))
    }
}
