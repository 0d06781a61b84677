//! Destinations for report tables.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ExportError, ExportOutcome, Table};

/// Characters that cannot appear in a file name on at least one supported platform.
const RESERVED_FILE_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Persists report tables, one destination per table name.
///
/// Implementations decide where a table goes based on [`Table::name()`]. A failure to persist
/// one table does not prevent later tables from being offered to the sink.
#[cfg_attr(test, mockall::automock)]
pub trait TableSink: Debug {
    /// Persists one table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table could not be persisted.
    fn write_table(&self, table: &Table) -> Result<(), ExportError>;
}

/// Writes each table as `<name>.csv` inside one directory.
///
/// Characters of the table name that are not allowed in file names (path separators
/// included) are replaced with `_`, so every table lands directly inside the directory.
///
/// # Examples
///
/// ```
/// use benched::{CsvDirectorySink, Table, TableSink};
///
/// let directory = tempfile::tempdir().unwrap();
/// let sink = CsvDirectorySink::create(directory.path().join("run"), ';').unwrap();
///
/// let mut table = Table::new("raw", ["Frame", "OK"]);
/// table.push_row(["0", "1"]);
/// sink.write_table(&table).unwrap();
///
/// let written = std::fs::read_to_string(sink.directory().join("raw.csv")).unwrap();
/// assert_eq!(written, "Frame;OK\n0;1");
/// ```
#[derive(Clone, Debug)]
pub struct CsvDirectorySink {
    directory: PathBuf,
    delimiter: char,
}

impl CsvDirectorySink {
    /// Creates the target directory (and any missing parents).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(directory: impl Into<PathBuf>, delimiter: char) -> Result<Self, ExportError> {
        let directory = directory.into();

        fs::create_dir_all(&directory).map_err(|source| ExportError::Io {
            destination: directory.display().to_string(),
            source,
        })?;

        Ok(Self {
            directory,
            delimiter,
        })
    }

    /// The directory tables are written into.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, table: &Table) -> PathBuf {
        self.directory.join(format!("{}.csv", file_stem_for(table.name())))
    }
}

fn file_stem_for(table_name: &str) -> String {
    let stem = table_name
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect::<String>();

    // "." and ".." would refer to the directory itself or its parent.
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "_".repeat(stem.len().max(1))
    } else {
        stem
    }
}

/// Result of [`Session::export_csv()`](crate::Session::export_csv).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CsvExport {
    directory: PathBuf,
    outcome: ExportOutcome,
}

impl CsvExport {
    pub(crate) fn new(directory: PathBuf, outcome: ExportOutcome) -> Self {
        Self { directory, outcome }
    }

    /// The directory the tables were written into.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// How many tables were written and how many failed.
    #[must_use]
    pub fn outcome(&self) -> ExportOutcome {
        self.outcome
    }
}

impl TableSink for CsvDirectorySink {
    fn write_table(&self, table: &Table) -> Result<(), ExportError> {
        let path = self.path_for(table);

        fs::write(&path, table.to_delimited(self.delimiter)).map_err(|source| ExportError::Io {
            destination: path.display().to_string(),
            source,
        })
    }
}
