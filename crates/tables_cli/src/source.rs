//! CSV files as table sources.

use csv::ReaderBuilder;
use std::path::PathBuf;
use tables_core::{Result, TableError, Value};
use tables_validator::{RowIter, TableSource};

/// A CSV file read with the `csv` crate; every open re-reads the file.
///
/// Rows may have any number of cells. Empty lines are skipped by the
/// reader and do not count towards row positions.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl TableSource for CsvSource {
    fn open(&self) -> Result<RowIter> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_path(&self.path)
            .map_err(|e| TableError::source(format!("cannot open \"{}\": {e}", self.path.display())))?;
        let rows = reader.into_records().map(|record| {
            record
                .map(|record| record.iter().map(|cell| Some(Value::from(cell))).collect())
                .map_err(|e| TableError::source(e.to_string()))
        });
        Ok(Box::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_reads_ragged_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "id;name\n1;a;extra\n2\n").unwrap();
        let source = CsvSource::new(file.path()).with_delimiter(b';');
        let rows: Vec<_> = source.open().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[2], vec![Some(Value::from("2"))]);
        assert!(source.restartable());
    }

    #[test]
    fn test_missing_file() {
        let err = CsvSource::new("/nonexistent/data.csv").open().err().unwrap();
        assert_eq!(err.code(), "source-error");
    }
}
