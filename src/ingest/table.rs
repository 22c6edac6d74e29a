//! Untyped CSV tables.

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

/// A header-led table of raw text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column names, in file order.
    pub headers: Vec<String>,
    /// Data rows; a row may be shorter than the header.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Returns the index of `column`, if present.
    pub fn column(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Returns the index of `column`, or a [`EngineError::MissingColumn`]
    /// naming `table`.
    pub fn require_column(&self, table: &str, column: &str) -> EngineResult<usize> {
        self.column(column).ok_or_else(|| EngineError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
    }

    /// Returns the trimmed cell at `index` of `row`.
    pub fn cell<'a>(&self, row: &'a [String], index: usize) -> Option<&'a str> {
        row.get(index).map(|cell| cell.trim())
    }
}

/// Reads a header-led CSV file into a [`RawTable`].
///
/// `label` names the source in errors and log events.
pub fn read_csv(path: &Path, label: &str) -> EngineResult<RawTable> {
    if !path.exists() {
        return Err(EngineError::SourceNotFound {
            label: label.to_string(),
            path: path.display().to_string(),
        });
    }

    let parse_error = |e: csv::Error| EngineError::SourceParseError {
        label: label.to_string(),
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(parse_error)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(str::to_string)
        .collect();
    debug!(source = label, columns = ?headers, "Read CSV header");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    info!(source = label, path = %path.display(), rows = rows.len(), "Loaded source table");

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_csv_headers_and_rows() {
        let file = write_csv("employe_id,branch_id,salary\nE1,B1,3000\nE2,B2,4000\n");

        let table = read_csv(file.path(), "employees").unwrap();

        assert_eq!(table.headers, vec!["employe_id", "branch_id", "salary"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["E2", "B2", "4000"]);
    }

    #[test]
    fn test_read_csv_keeps_empty_cells() {
        let file = write_csv("timesheet_id,employee_id,date,checkin,checkout\nt1,E1,2024-03-04,09:00:00,\n");

        let table = read_csv(file.path(), "timesheets").unwrap();

        assert_eq!(table.rows[0][4], "");
    }

    #[test]
    fn test_read_csv_short_row_has_no_cell() {
        let file = write_csv("a,b,c\n1,2\n");

        let table = read_csv(file.path(), "short").unwrap();

        assert_eq!(table.cell(&table.rows[0], 1), Some("2"));
        assert_eq!(table.cell(&table.rows[0], 2), None);
    }

    #[test]
    fn test_read_csv_missing_file() {
        let result = read_csv(Path::new("/nonexistent/employees.csv"), "employees");

        match result {
            Err(EngineError::SourceNotFound { label, path }) => {
                assert_eq!(label, "employees");
                assert!(path.contains("employees.csv"));
            }
            _ => panic!("Expected SourceNotFound error"),
        }
    }

    #[test]
    fn test_require_column_reports_table() {
        let table = RawTable {
            headers: vec!["a".to_string()],
            rows: vec![],
        };

        assert_eq!(table.require_column("t", "a").unwrap(), 0);
        assert!(matches!(
            table.require_column("t", "b"),
            Err(EngineError::MissingColumn { .. })
        ));
    }
}
